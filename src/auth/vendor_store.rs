//! Vendor Storage
//! Mission: Securely store and look up vendor accounts in SQLite

use crate::auth::models::{normalize_email, RegisterRequest, Vendor};
use crate::auth::password::PasswordHasher;
use crate::db::{decode_ts, decode_uuid, encode_ts, Database};
use anyhow::Context;
use chrono::Utc;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

const VENDOR_COLUMNS: &str = "id, email, password_hash, name, business_name, phone, created_at";

/// Vendor store errors
#[derive(Debug)]
pub enum VendorStoreError {
    DuplicateEmail,
    InvalidCredentials,
    NotFound,
    Internal(anyhow::Error),
}

impl fmt::Display for VendorStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorStoreError::DuplicateEmail => write!(f, "Email already registered"),
            VendorStoreError::InvalidCredentials => write!(f, "Invalid credentials"),
            VendorStoreError::NotFound => write!(f, "Vendor not found"),
            VendorStoreError::Internal(e) => write!(f, "Vendor store failure: {:#}", e),
        }
    }
}

impl std::error::Error for VendorStoreError {}

impl From<anyhow::Error> for VendorStoreError {
    fn from(err: anyhow::Error) -> Self {
        VendorStoreError::Internal(err)
    }
}

impl From<rusqlite::Error> for VendorStoreError {
    fn from(err: rusqlite::Error) -> Self {
        VendorStoreError::Internal(err.into())
    }
}

/// Vendor storage with SQLite backend
pub struct VendorStore {
    db: Database,
    hasher: PasswordHasher,
    // Verified against when the email is unknown so both failure paths cost the same
    dummy_hash: String,
}

impl VendorStore {
    pub fn new(db: Database, hasher: PasswordHasher) -> anyhow::Result<Self> {
        let dummy_hash = hasher
            .hash(&Uuid::new_v4().to_string())
            .context("Failed to prepare dummy password hash")?;
        Ok(Self {
            db,
            hasher,
            dummy_hash,
        })
    }

    /// Register a new vendor. Email uniqueness is case-insensitive.
    pub fn register(&self, request: &RegisterRequest) -> Result<Vendor, VendorStoreError> {
        let vendor = Vendor {
            id: Uuid::new_v4(),
            email: normalize_email(&request.email),
            password_hash: self.hasher.hash(&request.password)?,
            name: request.name.trim().to_string(),
            business_name: request.business_name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            created_at: Utc::now(),
        };

        let conn = self.db.lock();
        // The UNIQUE index decides; no check-then-insert window
        let inserted = conn.execute(
            "INSERT INTO vendors (id, email, password_hash, name, business_name, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                vendor.id.to_string(),
                vendor.email,
                vendor.password_hash,
                vendor.name,
                vendor.business_name,
                vendor.phone,
                encode_ts(&vendor.created_at),
            ],
        );

        match inserted {
            Ok(_) => {
                info!("✅ Registered vendor: {} ({})", vendor.email, vendor.id);
                Ok(vendor)
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                warn!("Registration rejected, email taken: {}", vendor.email);
                Err(VendorStoreError::DuplicateEmail)
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("Failed to insert vendor")
                .into()),
        }
    }

    /// Verify email and password. Unknown email and wrong password fail identically.
    pub fn verify(&self, email: &str, password: &str) -> Result<Vendor, VendorStoreError> {
        match self.get_vendor_by_email(email)? {
            Some(vendor) if self.hasher.verify(password, &vendor.password_hash) => Ok(vendor),
            Some(_) => Err(VendorStoreError::InvalidCredentials),
            None => {
                let _ = self.hasher.verify(password, &self.dummy_hash);
                Err(VendorStoreError::InvalidCredentials)
            }
        }
    }

    /// Get vendor by id
    pub fn fetch_by_id(&self, vendor_id: Uuid) -> Result<Vendor, VendorStoreError> {
        let conn = self.db.lock();
        let sql = format!("SELECT {} FROM vendors WHERE id = ?1", VENDOR_COLUMNS);
        conn.query_row(&sql, params![vendor_id.to_string()], vendor_from_row)
            .optional()?
            .ok_or(VendorStoreError::NotFound)
    }

    /// Get vendor by (normalized) email
    pub fn get_vendor_by_email(&self, email: &str) -> Result<Option<Vendor>, VendorStoreError> {
        let conn = self.db.lock();
        let sql = format!("SELECT {} FROM vendors WHERE email = ?1", VENDOR_COLUMNS);
        let vendor = conn
            .query_row(&sql, params![normalize_email(email)], vendor_from_row)
            .optional()?;
        Ok(vendor)
    }
}

fn vendor_from_row(row: &Row<'_>) -> rusqlite::Result<Vendor> {
    Ok(Vendor {
        id: decode_uuid(0, &row.get::<_, String>(0)?)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        business_name: row.get(4)?,
        phone: row.get(5)?,
        created_at: decode_ts(6, &row.get::<_, String>(6)?)?,
    })
}
