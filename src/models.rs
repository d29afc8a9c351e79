pub mod bonus;
pub mod events;
pub mod paystack;
pub mod plans;
pub mod profiles;
pub mod referrals;
pub mod transactions;
pub mod vpn;
pub mod wallet;
