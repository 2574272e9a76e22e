pub mod add_strategy;
pub mod buy_debt;
pub mod configure;
pub mod deposit;
pub mod initialize;
pub mod process_report;
pub mod revoke_strategy;
pub mod set_default_queue;
pub mod share_token;
pub mod shutdown;
pub mod update_debt;
pub mod withdraw;
