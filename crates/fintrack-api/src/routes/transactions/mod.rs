//! Transaction routes
//!
//! Every handler runs behind the authentication gate and passes the
//! authenticated user as owner; request input is validated by the service
//! before it reaches the store.

pub mod api;

pub use api::{
    create_transaction,
    delete_transaction,
    get_transaction,
    list_transactions,
    transaction_stats,
    update_transaction,
};
