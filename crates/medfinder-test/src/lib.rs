//! Medfinder pharmacy search server - integration test support.
//!
//! Re-exports the workspace crates so integration tests can reach every
//! layer through `medfinder_test::` paths.

pub mod component {
    pub use medfinder_core::{config, constants, error, geo};
    pub use medfinder_service::{identity, pharmacy, search};

    pub mod db {
        pub use medfinder_db::db::*;
        pub use medfinder_db::error::{DbError, DbResult};
        pub use medfinder_db::pipeline;
        pub use medfinder_db::store;
    }

    pub mod model {
        pub use medfinder_db::model::*;
    }
}

pub mod app {
    pub use medfinder_app::*;
}
