//! Shared fixtures for handler tests.

use std::sync::Arc;

use salvo::{Router, Service};

use medfinder_core::geo::{EARTH_RADIUS_METERS, GeoPoint};
use medfinder_db::model::medicine::MedicineEntry;
use medfinder_db::model::pharmacy::{NewPharmacyRecord, PharmacyProfile};
use medfinder_db::store::PharmacyStore;

use crate::app::api::routes;
use crate::config::{
    AuthConfig, AuthMethod, ConfigHandler, DatabaseBackend, DatabaseConfig, LoggingConfig,
    ProxyAuthConfig, SearchConfig, ServerConfig, Settings,
};
use crate::store_handler::StoreHandler;

pub const IDENTITY_HEADER: &str = "X-Pharmacy-Id";

pub fn open_settings() -> Settings {
    Settings {
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            backend: DatabaseBackend::Memory,
            run_migrations: false,
        },
        auth: AuthConfig {
            method: AuthMethod::Open,
            proxy: None,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        search: SearchConfig::default(),
    }
}

pub fn proxy_settings() -> Settings {
    let mut settings = open_settings();
    settings.auth = AuthConfig {
        method: AuthMethod::Proxy,
        proxy: Some(ProxyAuthConfig {
            header: IDENTITY_HEADER.to_string(),
        }),
    };
    settings
}

pub fn service_with(store: Arc<dyn PharmacyStore>, settings: Settings) -> Service {
    Service::new(
        Router::new()
            .hoop(StoreHandler { store })
            .hoop(ConfigHandler { settings })
            .push(routes()),
    )
}

/// Query point used across handler tests.
pub const ORIGIN: (f64, f64) = (81.6296, 21.2514);

pub fn base_url() -> &'static str {
    "http://127.0.0.1:5800"
}

/// A point `km` kilometers due north of [`ORIGIN`].
pub fn north_of_origin(km: f64) -> GeoPoint {
    let degrees = (km * 1000.0 / EARTH_RADIUS_METERS).to_degrees();
    GeoPoint::new(ORIGIN.0, ORIGIN.1 + degrees).unwrap()
}

pub fn medicine(name: &str) -> MedicineEntry {
    MedicineEntry {
        name: name.to_string(),
        price: 30.0,
        quantity: 8,
        expiry_date: chrono::NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
    }
}

pub async fn seed(
    store: &dyn PharmacyStore,
    tag: &str,
    km: f64,
    medicines: &[&str],
) -> PharmacyProfile {
    store
        .create_pharmacy(NewPharmacyRecord {
            name: format!("Owner {tag}"),
            email: format!("{tag}@example.com"),
            phone: format!("phone-{tag}"),
            pharmacy_name: Some(format!("{tag} Medicals")),
            location: north_of_origin(km),
            medicines: medicines.iter().map(|name| medicine(name)).collect(),
        })
        .await
        .unwrap()
}
