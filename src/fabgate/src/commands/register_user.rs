use crate::lib::environment::Environment;
use crate::lib::error::FabgateResult;
use clap::Parser;
use slog::info;

/// Registers and enrolls a user on the admin's authority and stores it in the wallet.
#[derive(Parser)]
pub struct RegisterUserOpts {
    /// The label, and enrollment id, of the new user.
    identity: String,
}

pub async fn exec(env: &Environment, opts: RegisterUserOpts) -> FabgateResult {
    let lifecycle = env.new_lifecycle_manager(env.get_wallet()?)?;
    lifecycle.register_user(&opts.identity).await?;
    info!(
        env.get_logger(),
        r#"Successfully registered and enrolled user "{}" and imported it into the wallet."#,
        opts.identity
    );
    Ok(())
}
