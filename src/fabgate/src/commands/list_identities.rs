use crate::lib::environment::Environment;
use crate::lib::error::FabgateResult;
use clap::Parser;

/// Lists the identities in the wallet.
#[derive(Parser)]
pub struct ListIdentitiesOpts {}

pub fn exec(env: &Environment, _opts: ListIdentitiesOpts) -> FabgateResult {
    for label in env.get_wallet()?.list()? {
        println!("{}", label);
    }
    Ok(())
}
