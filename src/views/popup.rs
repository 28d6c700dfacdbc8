//! Marker popup: a plain data model bound to one record, plus the HTML
//! template it renders through.

use crate::record::{Level, Record};

/// Shown when a record has no images
pub const DEFAULT_IMAGE: &str = "/default-avatar.png";

pub const POPUP_MIN_WIDTH: u32 = 200;
pub const POPUP_MAX_WIDTH: u32 = 250;

/// Cyclic image carousel
#[derive(Debug, Clone, PartialEq)]
pub struct Carousel {
    images: Vec<String>,
    index: usize,
}

impl Carousel {
    /// Starts at the first image; an empty list shows [`DEFAULT_IMAGE`]
    pub fn new(images: &[String]) -> Self {
        let images = if images.is_empty() {
            vec![DEFAULT_IMAGE.to_string()]
        } else {
            images.to_vec()
        };
        Self { images, index: 0 }
    }

    pub fn current(&self) -> &str {
        &self.images[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Previous/next controls only appear with more than one image
    pub fn has_controls(&self) -> bool {
        self.images.len() > 1
    }

    pub fn next(&mut self) -> &str {
        self.index = (self.index + 1) % self.images.len();
        self.current()
    }

    pub fn previous(&mut self) -> &str {
        self.index = (self.index + self.images.len() - 1) % self.images.len();
        self.current()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub record_id: String,
    pub title: String,
    /// `"<description> (<level>)"`
    pub summary: String,
    /// `"Location: <location>"`
    pub location_line: String,
    pub carousel: Carousel,
    /// The Inquire control is offered only for Available records
    pub show_inquire: bool,
}

impl Popup {
    pub fn for_record(record: &Record) -> Self {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();

        Self {
            record_id: record.id.clone(),
            title: text(&record.name),
            summary: format!("{} ({})", text(&record.description), text(&record.level)),
            location_line: format!("Location: {}", text(&record.location)),
            carousel: Carousel::new(&record.images),
            show_inquire: record.known_level() == Some(Level::Available),
        }
    }

    /// Render the popup markup. Carousel controls and the Inquire button
    /// carry `data-action` attributes for the page script to bind.
    pub fn render_html(&self) -> String {
        let controls = if self.carousel.has_controls() {
            r#"
    <div class="carousel-prev" data-action="previous">&#10094;</div>
    <div class="carousel-next" data-action="next">&#10095;</div>"#
        } else {
            ""
        };

        let inquire = if self.show_inquire {
            format!(
                r#"
  <button class="inquire" data-action="inquire" data-record-id="{}">Inquire</button>"#,
                escape_html(&self.record_id)
            )
        } else {
            String::new()
        };

        format!(
            r#"<div class="map-pop-up" style="min-width: {min}px; max-width: {max}px">
  <p class="object-name">{title}</p>
  <p class="object-description">{summary}</p>
  <p class="object-location">{location}</p>
  <div class="image-carousel" data-index="{index}" data-count="{count}">
    <img src="{src}" alt="{title}">{controls}
  </div>{inquire}
</div>"#,
            min = POPUP_MIN_WIDTH,
            max = POPUP_MAX_WIDTH,
            title = escape_html(&self.title),
            summary = escape_html(&self.summary),
            location = escape_html(&self.location_line),
            index = self.carousel.index(),
            count = self.carousel.len(),
            src = escape_html(self.carousel.current()),
            controls = controls,
            inquire = inquire,
        )
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: Option<&str>, images: &[&str]) -> Record {
        let mut record = Record::new("65f0c1a2b3c4d5e6f7a8b9c0");
        record.name = Some("Sofa".to_string());
        record.description = Some("Used".to_string());
        record.level = level.map(str::to_string);
        record.location = Some("40.0, -73.0".to_string());
        record.images = images.iter().map(|s| s.to_string()).collect();
        record
    }

    #[test]
    fn test_carousel_wraps_both_ways() {
        let images: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut carousel = Carousel::new(&images);
        assert_eq!(carousel.current(), "a");
        assert_eq!(carousel.previous(), "c");
        assert_eq!(carousel.index(), 2);
        assert_eq!(carousel.next(), "a");
        assert_eq!(carousel.next(), "b");
        assert_eq!(carousel.next(), "c");
        assert_eq!(carousel.next(), "a");
    }

    #[test]
    fn test_carousel_defaults_when_empty() {
        let mut carousel = Carousel::new(&[]);
        assert_eq!(carousel.current(), DEFAULT_IMAGE);
        assert!(!carousel.has_controls());
        assert_eq!(carousel.next(), DEFAULT_IMAGE);
        assert_eq!(carousel.previous(), DEFAULT_IMAGE);
    }

    #[test]
    fn test_inquire_only_for_available() {
        assert!(Popup::for_record(&record(Some("Available"), &[])).show_inquire);
        for level in [Some("Inquired"), Some("Taken"), Some(""), Some("available"), None] {
            let popup = Popup::for_record(&record(level, &[]));
            assert!(!popup.show_inquire, "level {:?}", level);
            assert!(!popup.render_html().contains("Inquire</button>"));
        }
    }

    #[test]
    fn test_popup_text_lines() {
        let popup = Popup::for_record(&record(Some("Taken"), &["x.png"]));
        assert_eq!(popup.title, "Sofa");
        assert_eq!(popup.summary, "Used (Taken)");
        assert_eq!(popup.location_line, "Location: 40.0, -73.0");
    }

    #[test]
    fn test_render_escapes_and_shows_controls() {
        let mut rec = record(Some("Available"), &["a.png", "b.png"]);
        rec.name = Some("<script>alert(1)</script>".to_string());
        let html = Popup::for_record(&rec).render_html();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(r#"data-action="previous""#));
        assert!(html.contains(r#"data-action="next""#));
        assert!(html.contains(r#"data-record-id="65f0c1a2b3c4d5e6f7a8b9c0""#));
        assert!(html.contains(r#"<img src="a.png""#));
    }

    #[test]
    fn test_render_single_image_has_no_controls() {
        let html = Popup::for_record(&record(Some("Inquired"), &["a.png"])).render_html();
        assert!(!html.contains("data-action=\"next\""));
        assert!(html.contains("Used (Inquired)"));
    }
}
