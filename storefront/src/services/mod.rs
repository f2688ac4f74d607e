pub mod admin;
pub mod checkout;
pub mod notify;
pub mod reconcile;
