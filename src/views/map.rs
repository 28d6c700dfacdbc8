//! Map view: fetches records, keeps those with a usable location, and turns
//! each into a marker with a status icon and popup.

use log::{debug, error};
use serde_json::Value;

use crate::client::ApiClient;
use crate::db::DynError;
use crate::location::{self, Coordinates};
use crate::record::{Level, Record};
use crate::views::popup::Popup;

pub const DEFAULT_CENTER: Coordinates = Coordinates { lat: 0.0, lon: 0.0 };
pub const DEFAULT_ZOOM: u8 = 2;
pub const TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";
/// Padding in pixels around markers when fitting the view
pub const FIT_PADDING: (u32, u32) = (50, 50);

pub const INQUIRE_SUCCESS: &str = "Object status updated to Inquired";
pub const INQUIRE_FAILURE: &str = "Failed to update object status";

#[derive(Debug, PartialEq, Eq)]
pub struct MapIcon {
    pub icon_url: &'static str,
    pub shadow_url: &'static str,
    pub size: (u32, u32),
    pub shadow_size: (u32, u32),
    pub anchor: (i32, i32),
    pub shadow_anchor: (i32, i32),
    pub popup_anchor: (i32, i32),
}

const SHADOW_URL: &str = "/res/location_x64_shadow.png";

const fn pin(icon_url: &'static str) -> MapIcon {
    MapIcon {
        icon_url,
        shadow_url: SHADOW_URL,
        size: (64, 64),
        shadow_size: (64, 64),
        anchor: (32, 64),
        shadow_anchor: (32, 64),
        popup_anchor: (0, -42),
    }
}

pub static AVAILABLE_ICON: MapIcon = pin("/res/available_location_x64.png");
pub static INQUIRED_ICON: MapIcon = pin("/res/inquired_location_x64.png");
pub static TAKEN_ICON: MapIcon = pin("/res/taken_location_x64.png");

/// Icon for a record's level. Unset or unrecognised levels get the inquired icon.
pub fn icon_for_level(level: Option<&str>) -> &'static MapIcon {
    match level.and_then(Level::parse) {
        Some(Level::Available) => &AVAILABLE_ICON,
        Some(Level::Taken) => &TAKEN_ICON,
        Some(Level::Inquired) | None => &INQUIRED_ICON,
    }
}

/// Whether a record can be placed on the map
pub fn has_valid_location(record: &Record) -> bool {
    record.location.as_deref().and_then(location::parse).is_some()
}

/// PATCH body for Inquire: the whole record with only `level` replaced
pub fn inquire_payload(record: &Record) -> Value {
    let mut body = record.to_json();
    if let Value::Object(map) = &mut body {
        map.insert(
            "level".to_string(),
            Value::String(Level::Inquired.as_str().to_string()),
        );
    }
    body
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    pub fn around<'a>(points: impl IntoIterator<Item = &'a Coordinates>) -> Option<Bounds> {
        points.into_iter().fold(None, |bounds, p| {
            Some(match bounds {
                None => Bounds {
                    south_west: *p,
                    north_east: *p,
                },
                Some(b) => Bounds {
                    south_west: Coordinates {
                        lat: b.south_west.lat.min(p.lat),
                        lon: b.south_west.lon.min(p.lon),
                    },
                    north_east: Coordinates {
                        lat: b.north_east.lat.max(p.lat),
                        lon: b.north_east.lon.max(p.lon),
                    },
                },
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub record_id: String,
    pub position: Coordinates,
    pub icon: &'static MapIcon,
    pub popup: Popup,
}

impl Marker {
    fn for_record(record: &Record) -> Result<Marker, DynError> {
        let raw = record.location.as_deref().unwrap_or_default();
        let position =
            location::parse(raw).ok_or_else(|| format!("unparsable location '{}'", raw))?;

        Ok(Marker {
            record_id: record.id.clone(),
            position,
            icon: icon_for_level(record.level.as_deref()),
            popup: Popup::for_record(record),
        })
    }
}

/// The map widget's state: viewport, drawn markers and last fitted bounds
#[derive(Debug, Clone, PartialEq)]
pub struct MapWidget {
    pub center: Coordinates,
    pub zoom: u8,
    pub tile_url: &'static str,
    pub attribution: &'static str,
    pub markers: Vec<Marker>,
    pub fitted: Option<(Bounds, (u32, u32))>,
}

impl MapWidget {
    fn new() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tile_url: TILE_URL,
            attribution: TILE_ATTRIBUTION,
            markers: Vec::new(),
            fitted: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MapView {
    records: Vec<Record>,
    map: Option<MapWidget>,
    pub alerts: Vec<String>,
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn map(&self) -> Option<&MapWidget> {
        self.map.as_ref()
    }

    pub fn markers(&self) -> &[Marker] {
        self.map.as_ref().map(|m| m.markers.as_slice()).unwrap_or(&[])
    }

    pub fn marker(&self, record_id: &str) -> Option<&Marker> {
        self.markers().iter().find(|m| m.record_id == record_id)
    }

    /// Fetch every record and keep the ones with a parsable location.
    /// A failed fetch is logged and leaves the current list in place.
    pub async fn load(&mut self, client: &ApiClient) {
        match client.list_records().await {
            Ok(records) => self.set_records(records),
            Err(e) => error!("Failed to fetch records: {}", e),
        }
    }

    /// Replace the record list, dropping records without a usable location
    pub fn set_records(&mut self, records: Vec<Record>) {
        let total = records.len();
        self.records = records.into_iter().filter(has_valid_location).collect();
        debug!("{} of {} records have a valid location", self.records.len(), total);
        self.redraw();
    }

    /// Create the map widget. Runs at most once; returns whether it created one.
    pub fn init_map(&mut self) -> bool {
        if self.map.is_some() {
            return false;
        }
        self.map = Some(MapWidget::new());
        self.redraw();
        true
    }

    /// Clear the drawn markers and draw one per record
    pub fn redraw(&mut self) {
        let Some(map) = self.map.as_mut() else {
            return;
        };

        map.markers.clear();
        for record in &self.records {
            match Marker::for_record(record) {
                Ok(marker) => map.markers.push(marker),
                Err(e) => error!(
                    "Error processing record {}: {}",
                    record.name.as_deref().unwrap_or(&record.id),
                    e
                ),
            }
        }

        if let Some(bounds) = Bounds::around(map.markers.iter().map(|m| &m.position)) {
            map.fitted = Some((bounds, FIT_PADDING));
        }
    }

    /// Flip a record to Inquired. On success the local copy changes and the
    /// markers are redrawn; on failure local state is left untouched.
    pub async fn inquire(&mut self, client: &ApiClient, record_id: &str) -> bool {
        let result = match self.records.iter().find(|r| r.id == record_id) {
            Some(record) => client
                .update_record(record_id, &inquire_payload(record))
                .await
                .map(|_| ()),
            None => Err(format!("record {} is not on the map", record_id).into()),
        };

        match result {
            Ok(()) => {
                for record in self.records.iter_mut().filter(|r| r.id == record_id) {
                    record.level = Some(Level::Inquired.as_str().to_string());
                }
                self.redraw();
                self.alerts.push(INQUIRE_SUCCESS.to_string());
                true
            }
            Err(e) => {
                error!("A problem occurred while inquiring: {}", e);
                self.alerts.push(INQUIRE_FAILURE.to_string());
                false
            }
        }
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, level: Option<&str>, location: Option<&str>) -> Record {
        let mut record = Record::new(id);
        record.name = Some(format!("item {}", id));
        record.description = Some("desc".to_string());
        record.level = level.map(str::to_string);
        record.location = location.map(str::to_string);
        record
    }

    #[test]
    fn test_icon_selection() {
        assert_eq!(icon_for_level(Some("Available")), &AVAILABLE_ICON);
        assert_eq!(icon_for_level(Some("Taken")), &TAKEN_ICON);
        assert_eq!(icon_for_level(Some("Inquired")), &INQUIRED_ICON);
        assert_eq!(icon_for_level(Some("")), &INQUIRED_ICON);
        assert_eq!(icon_for_level(Some("Gone")), &INQUIRED_ICON);
        assert_eq!(icon_for_level(None), &INQUIRED_ICON);
        assert_eq!(AVAILABLE_ICON.popup_anchor, (0, -42));
    }

    #[test]
    fn test_inquire_payload_only_changes_level() {
        let mut rec = record("a1", Some("Available"), Some("1, 2"));
        rec.images = vec!["http://h/uploads/1.png".to_string()];

        let payload = inquire_payload(&rec);
        let mut expected = rec.to_json();
        expected["level"] = json!("Inquired");
        assert_eq!(payload, expected);
        assert_eq!(payload["images"], json!(["http://h/uploads/1.png"]));
    }

    #[test]
    fn test_inquire_payload_sets_missing_level() {
        let payload = inquire_payload(&record("a1", None, Some("1, 2")));
        assert_eq!(payload["level"], json!("Inquired"));
    }

    #[test]
    fn test_set_records_filters_invalid_locations() {
        let mut view = MapView::new();
        view.set_records(vec![
            record("a", Some("Available"), Some("40.0,-73.0")),
            record("b", Some("Available"), Some("")),
            record("c", Some("Available"), None),
            record("d", Some("Available"), Some("1,2,3")),
            record("e", Some("Taken"), Some("x, y")),
            record("f", Some("Taken"), Some("51.5, -0.12")),
        ]);
        let ids: Vec<_> = view.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "f"]);
    }

    #[test]
    fn test_init_map_runs_once() {
        let mut view = MapView::new();
        assert!(view.init_map());
        assert!(!view.init_map());
        let map = view.map().unwrap();
        assert_eq!(map.center, DEFAULT_CENTER);
        assert_eq!(map.zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn test_redraw_without_map_draws_nothing() {
        let mut view = MapView::new();
        view.set_records(vec![record("a", Some("Available"), Some("1, 2"))]);
        assert!(view.markers().is_empty());

        view.init_map();
        assert_eq!(view.markers().len(), 1);
    }

    #[test]
    fn test_redraw_replaces_markers_and_fits_bounds() {
        let mut view = MapView::new();
        view.init_map();
        view.set_records(vec![
            record("a", Some("Available"), Some("10, 20")),
            record("b", Some("Taken"), Some("-5, 40")),
        ]);
        assert_eq!(view.markers().len(), 2);

        view.set_records(vec![record("c", None, Some("1, 1"))]);
        assert_eq!(view.markers().len(), 1);
        assert_eq!(view.markers()[0].icon, &INQUIRED_ICON);

        view.set_records(vec![
            record("a", Some("Available"), Some("10, 20")),
            record("b", Some("Taken"), Some("-5, 40")),
        ]);
        let (bounds, padding) = view.map().unwrap().fitted.unwrap();
        assert_eq!(bounds.south_west, Coordinates { lat: -5.0, lon: 20.0 });
        assert_eq!(bounds.north_east, Coordinates { lat: 10.0, lon: 40.0 });
        assert_eq!(padding, FIT_PADDING);
    }

    #[test]
    fn test_unparsable_record_is_skipped_not_fatal() {
        let mut view = MapView::new();
        view.init_map();
        view.records = vec![
            record("bad", Some("Available"), Some("nowhere")),
            record("good", Some("Available"), Some("3, 4")),
        ];
        view.redraw();
        assert_eq!(view.markers().len(), 1);
        assert_eq!(view.markers()[0].record_id, "good");
    }

    #[test]
    fn test_bounds_of_nothing() {
        assert_eq!(Bounds::around(std::iter::empty()), None);
    }
}
