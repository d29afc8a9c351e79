pub mod bonus;
pub mod payments;
pub mod plans;
pub mod profiles;
pub mod referrals;
pub mod transactions;
pub mod wallet;
