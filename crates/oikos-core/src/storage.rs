//! Flat-file storage for submissions.
//!
//! Contact and inquiry logs are append-only text files; bookings are kept as a
//! pretty-printed JSON array in `bookings.json`.

use crate::error::{Error, Result};
use crate::form::{BookingRequest, ContactMessage, GetStartedInquiry};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Contact log file name.
pub const CONTACT_LOG: &str = "contact-log.txt";
/// One-line inquiry log file name.
pub const GET_STARTED_LOG: &str = "getstarted-log.txt";
/// Detailed inquiry log file name.
pub const GET_STARTED_DETAILED_LOG: &str = "getstarted-detailed.txt";
/// Bookings file name.
pub const BOOKINGS_FILE: &str = "bookings.json";

/// Timestamp format used in logs and records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    /// Guest full name.
    pub full_name: String,
    /// Guest email.
    pub email: String,
    /// Guest phone.
    pub phone: String,
    /// Requested check-in date.
    pub checkin_date: String,
    /// Number of guests.
    pub guests: String,
    /// Selected package.
    pub package_name: String,
    /// Package price.
    #[serde(default)]
    pub package_price: String,
    /// Free-form requests.
    #[serde(default)]
    pub special_requests: String,
    /// Submission time, `YYYY-MM-DD HH:MM:SS` local time.
    pub timestamp: String,
    /// Booking id, `booking_` followed by hex seconds and microseconds.
    pub id: String,
}

impl BookingRecord {
    /// Creates a record for `request` submitted at `at`.
    #[must_use]
    pub fn new(request: BookingRequest, at: DateTime<Local>) -> Self {
        Self {
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            checkin_date: request.checkin_date,
            guests: request.guests,
            package_name: request.package_name,
            package_price: request.package_price,
            special_requests: request.special_requests,
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            id: booking_id(at),
        }
    }
}

/// Builds a time-based booking id: `booking_` + 8 hex digits of seconds +
/// 5 hex digits of microseconds.
#[must_use]
pub fn booking_id(at: DateTime<Local>) -> String {
    format!(
        "booking_{:08x}{:05x}",
        at.timestamp(),
        at.timestamp_subsec_micros()
    )
}

/// Append-only store for form submissions.
#[derive(Debug)]
pub struct SubmissionStore {
    dir: PathBuf,
    bookings: Mutex<()>,
}

impl SubmissionStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            bookings: Mutex::new(()),
        }
    }

    /// Directory holding the files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the storage directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Appends one line to the contact log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub async fn append_contact(&self, message: &ContactMessage, at: DateTime<Local>) -> Result<()> {
        let line = format!(
            "{} | Name: {} | Email: {} | Phone: {} | Message: {}\n",
            at.format(TIMESTAMP_FORMAT),
            one_line(&message.name),
            one_line(&message.email),
            one_line(&message.phone),
            one_line(&message.body),
        );
        self.append(CONTACT_LOG, &line).await
    }

    /// Appends an inquiry to both inquiry logs.
    ///
    /// # Errors
    ///
    /// Returns an error if either log cannot be written.
    pub async fn append_get_started(
        &self,
        inquiry: &GetStartedInquiry,
        at: DateTime<Local>,
        client_ip: Option<IpAddr>,
    ) -> Result<()> {
        let stamp = at.format(TIMESTAMP_FORMAT);
        let line = format!(
            "{stamp} | Name: {} | Email: {} | Phone: {} | Interested: {}\n",
            one_line(&inquiry.name),
            one_line(&inquiry.email),
            one_line(&inquiry.phone),
            one_line(&inquiry.interested),
        );
        self.append(GET_STARTED_LOG, &line).await?;

        let ip = client_ip.map_or_else(|| "unknown".to_string(), |ip| ip.to_string());
        let block = format!(
            "=== GET STARTED SUBMISSION ===\n\
             Timestamp: {stamp}\n\
             Name: {}\n\
             Email: {}\n\
             Phone: {}\n\
             Interested In: {}\n\
             IP Address: {ip}\n\
             ==============================\n\n",
            one_line(&inquiry.name),
            one_line(&inquiry.email),
            one_line(&inquiry.phone),
            one_line(&inquiry.interested),
        );
        self.append(GET_STARTED_DETAILED_LOG, &block).await
    }

    /// Appends a booking to `bookings.json`.
    ///
    /// Concurrent saves are serialized. A file that no longer parses is moved
    /// aside to a timestamped `bookings.json.<time>.bak` and a new array is
    /// started; earlier backups are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written. Read errors
    /// leave the file in place.
    pub async fn save_booking(&self, record: &BookingRecord) -> Result<()> {
        let _guard = self.bookings.lock().await;

        let path = self.dir.join(BOOKINGS_FILE);
        let mut bookings = match self.read_bookings(&path).await {
            Ok(bookings) => bookings,
            Err(Error::Serde(e)) => {
                let backup = self.backup_path(Local::now()).await?;
                warn!(
                    error = %e,
                    backup = %backup.display(),
                    "bookings file does not parse, moving it aside"
                );
                fs::rename(&path, &backup).await?;
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        bookings.push(record.clone());

        let json = serde_json::to_vec_pretty(&bookings)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        debug!(id = %record.id, total = bookings.len(), "booking saved");
        Ok(())
    }

    /// Loads all stored bookings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_bookings(&self) -> Result<Vec<BookingRecord>> {
        self.read_bookings(&self.dir.join(BOOKINGS_FILE)).await
    }

    async fn read_bookings(&self, path: &Path) -> Result<Vec<BookingRecord>> {
        match fs::read(path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn backup_path(&self, at: DateTime<Local>) -> Result<PathBuf> {
        let stamp = at.format("%Y%m%d-%H%M%S");
        let mut candidate = self.dir.join(format!("{BOOKINGS_FILE}.{stamp}.bak"));
        let mut n = 1;
        while fs::try_exists(&candidate).await? {
            candidate = self.dir.join(format!("{BOOKINGS_FILE}.{stamp}-{n}.bak"));
            n += 1;
        }
        Ok(candidate)
    }

    async fn append(&self, name: &str, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(name))
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Keeps a record on one line.
fn one_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
