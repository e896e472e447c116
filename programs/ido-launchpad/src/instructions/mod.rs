pub mod initialize_factory;
pub mod configure_factory;
pub mod create_pool;
pub mod pay;
pub mod claim;
pub mod refund;
pub mod withdraw;
pub mod reclaim_reserve;
pub mod initialize_locker_factory;
pub mod locker_admin;
pub mod create_locker;
pub mod unlock;

pub use initialize_factory::*;
pub use configure_factory::*;
pub use create_pool::*;
pub use pay::*;
pub use claim::*;
pub use refund::*;
pub use withdraw::*;
pub use reclaim_reserve::*;
pub use initialize_locker_factory::*;
pub use locker_admin::*;
pub use create_locker::*;
pub use unlock::*;
