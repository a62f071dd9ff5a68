pub mod auth;
pub mod debtors;
pub mod errors;
pub mod ledger;
pub mod schemas;
pub mod split;
