use crate::lib::environment::Environment;
use crate::lib::error::FabgateResult;
use clap::Subcommand;

mod enroll_admin;
mod list_identities;
mod query;
mod register_user;
mod serve;

#[derive(Subcommand)]
pub enum FabgateCommand {
    EnrollAdmin(enroll_admin::EnrollAdminOpts),
    ListIdentities(list_identities::ListIdentitiesOpts),
    Query(query::QueryOpts),
    RegisterUser(register_user::RegisterUserOpts),
    Serve(serve::ServeOpts),
}

pub async fn exec(env: &Environment, cmd: FabgateCommand) -> FabgateResult {
    match cmd {
        FabgateCommand::EnrollAdmin(v) => enroll_admin::exec(env, v).await,
        FabgateCommand::ListIdentities(v) => list_identities::exec(env, v),
        FabgateCommand::Query(v) => query::exec(env, v).await,
        FabgateCommand::RegisterUser(v) => register_user::exec(env, v).await,
        FabgateCommand::Serve(v) => serve::exec(env, v).await,
    }
}
