use crate::lib::environment::Environment;
use crate::lib::error::FabgateResult;
use clap::Parser;
use slog::info;

/// Enrolls the bootstrap admin with the certificate authority and stores it in the wallet.
#[derive(Parser)]
pub struct EnrollAdminOpts {}

pub async fn exec(env: &Environment, _opts: EnrollAdminOpts) -> FabgateResult {
    let lifecycle = env.new_lifecycle_manager(env.get_wallet()?)?;
    lifecycle.enroll_admin().await?;
    info!(
        env.get_logger(),
        r#"Successfully enrolled admin user "{}" and imported it into the wallet."#,
        lifecycle.admin_label()
    );
    Ok(())
}
