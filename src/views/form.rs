//! Create/edit form view.

use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::client::{ApiClient, ImageFile};
use crate::constants::MAX_IMAGES;
use crate::location::{self, Coordinates};
use crate::record::{Level, Record};
use crate::views::Navigation;

pub const UPLOAD_FAILURE: &str = "Error uploading image";
pub const GEOLOCATION_UNSUPPORTED: &str = "Geolocation is not supported by your browser.";
pub const GEOLOCATION_FAILURE: &str = "Unable to retrieve location.";
pub const SUBMIT_FAILURE: &str = "Failed to save object listing";

#[derive(Debug, Clone)]
pub enum GeolocationError {
    /// The platform offers no position source
    Unsupported,
    Failed(String),
}

/// Source of the device's current position
pub trait Geolocator {
    fn current_position(&self) -> impl Future<Output = Result<Coordinates, GeolocationError>> + Send;
}

/// The editable copy of a record's fields, serialised as the request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordForm {
    pub name: String,
    pub description: String,
    pub level: String,
    pub location: String,
    pub images: Vec<String>,
}

impl RecordForm {
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone().unwrap_or_default(),
            description: record.description.clone().unwrap_or_default(),
            level: record.level.clone().unwrap_or_default(),
            location: record.location.clone().unwrap_or_default(),
            images: record.images.clone(),
        }
    }
}

/// Edits the user can make directly. Location has no entry here: it is
/// only written by [`FormView::capture_location`].
#[derive(Debug, Clone)]
pub enum FormUpdate {
    Name(String),
    Description(String),
    Level(Level),
}

#[derive(Debug, Default)]
pub struct FormView {
    pub form: RecordForm,
    /// Set when editing an existing record
    pub record_id: Option<String>,
    pub previews: Vec<String>,
    pub alerts: Vec<String>,
}

impl FormView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new(&self) -> bool {
        self.record_id.is_none()
    }

    /// Load the record to edit, if any. Returns a navigation when the record
    /// does not exist.
    pub async fn mount(&mut self, client: &ApiClient, id: Option<&str>) -> Option<Navigation> {
        let id = id?;
        self.record_id = Some(id.to_string());

        match client.get_record(id).await {
            Ok(Some(record)) => {
                self.form = RecordForm::from_record(&record);
                self.previews = record.images;
                None
            }
            Ok(None) => {
                warn!("Record with id {} not found", id);
                Some(Navigation::Listing)
            }
            Err(e) => {
                error!("An error has occurred: {}", e);
                None
            }
        }
    }

    pub fn update(&mut self, update: FormUpdate) {
        match update {
            FormUpdate::Name(name) => self.form.name = name,
            FormUpdate::Description(description) => self.form.description = description,
            FormUpdate::Level(level) => self.form.level = level.as_str().to_string(),
        }
    }

    pub fn remaining_slots(&self) -> usize {
        MAX_IMAGES.saturating_sub(self.previews.len())
    }

    /// Upload newly picked files one after another. Files beyond the free
    /// slots are ignored; failed uploads are dropped from the result.
    pub async fn upload_images(&mut self, client: &ApiClient, files: Vec<ImageFile>) {
        let accepted = self.remaining_slots();
        if files.len() > accepted {
            warn!(
                "Ignoring {} of {} selected images (limit {})",
                files.len() - accepted,
                files.len(),
                MAX_IMAGES
            );
        }

        for file in files.into_iter().take(accepted) {
            match client.upload_image(&file).await {
                Ok(url) => {
                    self.previews.push(url.clone());
                    self.form.images.push(url);
                }
                Err(e) => {
                    error!("Error uploading image {}: {}", file.name, e);
                    self.alerts.push(UPLOAD_FAILURE.to_string());
                }
            }
        }
    }

    /// Remove the image at `index` from both the previews and the form
    pub fn remove_image(&mut self, index: usize) {
        if index < self.previews.len() {
            self.previews.remove(index);
        }
        if index < self.form.images.len() {
            self.form.images.remove(index);
        }
    }

    /// Ask for the current position once and write it into the location field
    pub async fn capture_location<G: Geolocator>(&mut self, geolocator: &G) {
        match geolocator.current_position().await {
            Ok(position) => self.form.location = location::format(position.lat, position.lon),
            Err(GeolocationError::Unsupported) => {
                self.alerts.push(GEOLOCATION_UNSUPPORTED.to_string());
            }
            Err(GeolocationError::Failed(reason)) => {
                error!("Error getting location: {}", reason);
                self.alerts.push(GEOLOCATION_FAILURE.to_string());
            }
        }
    }

    /// Create or update depending on whether a record was loaded. The form
    /// resets and the view moves to the listing either way.
    pub async fn submit(&mut self, client: &ApiClient) -> Navigation {
        let result = match &self.record_id {
            None => client.create_record(&self.form).await,
            Some(id) => client.update_record(id, &self.form).await,
        };

        if let Err(e) = result {
            error!("A problem occurred while saving: {}", e);
            self.alerts.push(SUBMIT_FAILURE.to_string());
        }

        self.form = RecordForm::default();
        self.previews.clear();
        Navigation::Listing
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }
}
