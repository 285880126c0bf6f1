//! Composition parameter records.
//!
//! Each template turns a [`RenderRequest`] into one or more render jobs, each
//! carrying the JSON parameters its composition expects. Every builder
//! rejects an empty photo list before anything is rendered.

use estate_models::{BrandConfig, EffectsConfig, PhotoInput, RenderRequest, Template};
use serde::Serialize;
use serde_json::Value;

use crate::command::RenderMode;
use crate::error::{RenderError, RenderResult};

/// Number of photos a reel always shows.
pub const REEL_PHOTO_COUNT: usize = 5;

/// Maximum number of photo slides in a carousel.
pub const MAX_CAROUSEL_PHOTO_SLIDES: usize = 3;

/// Title used when the request carries none.
pub const DEFAULT_TITLE: &str = "Oferta";

const NO_PHOTOS: &str = "Dodaj przynajmniej 1 zdjęcie";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoProps {
    pub src: String,
    pub label: String,
}

/// Listing block of the reel parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelListing {
    pub title: String,
    pub location: String,
    pub price: String,
    pub area: String,
    pub rooms: String,
    pub floor: String,
    pub year: String,
    pub features: Vec<String>,
    pub agent: String,
    pub agent_phone: String,
    pub photos: Vec<PhotoProps>,
}

/// Parameters of the `RealEstateReel` composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReelProps {
    pub listing: ReelListing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<EffectsConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideType {
    Cover,
    Photo,
    Details,
    Cta,
}

/// Fields shared by every carousel slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselBase {
    pub title: String,
    pub location: String,
    pub price: String,
    pub area: String,
    pub rooms: String,
    pub floor: String,
    pub year: String,
    pub features: Vec<String>,
    pub agent: String,
    pub agent_phone: String,
    pub total_slides: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandConfig>,
}

/// Parameters of one `CarouselSlide` still.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselSlideProps {
    #[serde(flatten)]
    pub base: CarouselBase,
    pub slide_type: SlideType,
    pub photo_src: String,
    pub photo_label: String,
    pub slide_number: usize,
    /// File-name part of the rendered still
    #[serde(skip)]
    pub name: String,
}

/// Parameters of the `SoldVideo` composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldProps {
    pub title: String,
    pub location: String,
    pub price: String,
    pub agent: String,
    pub agent_phone: String,
    pub photo_src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandConfig>,
}

/// One invocation of the render tool.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub mode: RenderMode,
    pub composition: &'static str,
    /// Slide name for stills; empty for videos
    pub name: String,
    pub props: Value,
}

fn require_photos(request: &RenderRequest) -> RenderResult<&[PhotoInput]> {
    if request.photos.is_empty() {
        return Err(RenderError::validation(NO_PHOTOS));
    }
    Ok(&request.photos)
}

fn title_or_default(request: &RenderRequest) -> String {
    request
        .title
        .clone()
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Build the reel parameters.
///
/// Photos are padded to [`REEL_PHOTO_COUNT`] by repeating the last one and
/// capped at the same count.
pub fn build_reel(request: &RenderRequest) -> RenderResult<ReelProps> {
    let photos = require_photos(request)?;
    let effects = request
        .effects()
        .map_err(|e| RenderError::validation(e.to_string()))?;

    let mut padded: Vec<PhotoProps> = photos
        .iter()
        .take(REEL_PHOTO_COUNT)
        .map(|p| PhotoProps {
            src: p.path.clone(),
            label: p.label().unwrap_or_default().to_string(),
        })
        .collect();
    while padded.len() < REEL_PHOTO_COUNT {
        let last = padded[padded.len() - 1].clone();
        padded.push(last);
    }

    Ok(ReelProps {
        listing: ReelListing {
            title: title_or_default(request),
            location: request.location.clone(),
            price: request.price.clone(),
            area: request.area.clone(),
            rooms: request.rooms.clone(),
            floor: request.floor.clone(),
            year: request.year.clone(),
            features: request.features.clone(),
            agent: request.agent.clone(),
            agent_phone: request.agent_phone.clone(),
            photos: padded,
        },
        brand: request.brand(),
        effects,
    })
}

/// Build the carousel slides: cover, up to three photos, details, cta.
pub fn build_carousel(request: &RenderRequest) -> RenderResult<Vec<CarouselSlideProps>> {
    let photos = require_photos(request)?;
    let photo_slides = &photos[..photos.len().min(MAX_CAROUSEL_PHOTO_SLIDES)];
    let total_slides = 2 + photo_slides.len() + 1;

    let base = CarouselBase {
        title: title_or_default(request),
        location: request.location.clone(),
        price: request.price.clone(),
        area: request.area.clone(),
        rooms: request.rooms.clone(),
        floor: request.floor.clone(),
        year: request.year.clone(),
        features: request.features.clone(),
        agent: request.agent.clone(),
        agent_phone: request.agent_phone.clone(),
        total_slides,
        brand: request.brand(),
    };

    let first = &photos[0];
    let mut slides = Vec::with_capacity(total_slides);
    let mut push = |name: String, slide_type: SlideType, photo: &PhotoInput, label: String| {
        let slide_number = slides.len() + 1;
        slides.push(CarouselSlideProps {
            base: base.clone(),
            slide_type,
            photo_src: photo.path.clone(),
            photo_label: label,
            slide_number,
            name,
        });
    };

    push(
        "cover".to_string(),
        SlideType::Cover,
        first,
        first.label().unwrap_or_default().to_string(),
    );
    for (i, photo) in photo_slides.iter().enumerate() {
        let label = photo
            .label()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Zdjecie {}", i + 1));
        push(format!("photo{}", i + 1), SlideType::Photo, photo, label);
    }
    push("details".to_string(), SlideType::Details, first, String::new());
    push("cta".to_string(), SlideType::Cta, first, String::new());

    Ok(slides)
}

/// Build the sold-announcement parameters from the first photo.
pub fn build_sold(request: &RenderRequest) -> RenderResult<SoldProps> {
    let photos = require_photos(request)?;

    Ok(SoldProps {
        title: request.title.clone().unwrap_or_default(),
        location: request.location.clone(),
        price: request.price.clone(),
        agent: request.agent.clone(),
        agent_phone: request.agent_phone.clone(),
        photo_src: photos[0].path.clone(),
        brand: request.brand(),
    })
}

/// Tool invocations needed for a request, in render order.
pub fn render_jobs(template: Template, request: &RenderRequest) -> RenderResult<Vec<RenderJob>> {
    let composition = template.composition();

    let jobs = match template {
        Template::Reel => vec![RenderJob {
            mode: RenderMode::Render,
            composition,
            name: String::new(),
            props: serde_json::to_value(build_reel(request)?)?,
        }],
        Template::Sold => vec![RenderJob {
            mode: RenderMode::Render,
            composition,
            name: String::new(),
            props: serde_json::to_value(build_sold(request)?)?,
        }],
        Template::Carousel => build_carousel(request)?
            .into_iter()
            .map(|slide| {
                Ok(RenderJob {
                    mode: RenderMode::Still,
                    composition,
                    props: serde_json::to_value(&slide)?,
                    name: slide.name,
                })
            })
            .collect::<RenderResult<Vec<_>>>()?,
    };

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_models::{EffectsInput, Tempo};
    use serde_json::json;

    fn photo(path: &str, label: Option<&str>) -> PhotoInput {
        PhotoInput {
            path: path.to_string(),
            label: label.map(str::to_string),
        }
    }

    fn request_with(photos: Vec<PhotoInput>) -> RenderRequest {
        RenderRequest {
            location: "Gdansk, Oliwa".to_string(),
            price: "890 000 PLN".to_string(),
            agent: "Anna".to_string(),
            photos,
            ..Default::default()
        }
    }

    #[test]
    fn test_reel_pads_to_five() {
        let request = request_with(vec![
            photo("uploads/s/a.jpg", Some("Salon")),
            photo("uploads/s/b.jpg", None),
        ]);
        let props = build_reel(&request).unwrap();
        let srcs: Vec<_> = props.listing.photos.iter().map(|p| p.src.as_str()).collect();
        assert_eq!(
            srcs,
            vec![
                "uploads/s/a.jpg",
                "uploads/s/b.jpg",
                "uploads/s/b.jpg",
                "uploads/s/b.jpg",
                "uploads/s/b.jpg"
            ]
        );
        assert_eq!(props.listing.photos[0].label, "Salon");
        assert_eq!(props.listing.photos[4].label, "");
        assert_eq!(props.listing.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_reel_caps_at_five() {
        let photos = (0..8).map(|i| photo(&format!("uploads/s/{i}.jpg"), None)).collect();
        let props = build_reel(&request_with(photos)).unwrap();
        assert_eq!(props.listing.photos.len(), REEL_PHOTO_COUNT);
        assert_eq!(props.listing.photos[4].src, "uploads/s/4.jpg");
    }

    #[test]
    fn test_reel_serialization() {
        let mut request = request_with(vec![photo("uploads/s/a.jpg", None)]);
        request.title = Some("Dom".to_string());
        request.agent_phone = "500 100 200".to_string();

        let value = serde_json::to_value(build_reel(&request).unwrap()).unwrap();
        assert_eq!(value["listing"]["title"], "Dom");
        assert_eq!(value["listing"]["agentPhone"], "500 100 200");
        assert_eq!(value["listing"]["photos"][0], json!({"src": "uploads/s/a.jpg", "label": ""}));
        assert!(value.get("brand").is_none());
        assert!(value.get("effects").is_none());
    }

    #[test]
    fn test_reel_effects_and_brand() {
        let mut request = request_with(vec![photo("uploads/s/a.jpg", None)]);
        request.effects = Some(EffectsInput {
            tempo: Some("fast".to_string()),
            ..Default::default()
        });
        request.headline = Some("NOWOSC".to_string());

        let props = build_reel(&request).unwrap();
        assert_eq!(props.effects.unwrap().tempo, Tempo::Fast);
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(value["brand"], json!({"headline": "NOWOSC"}));
        assert_eq!(
            value["effects"],
            json!({"tempo": "fast", "textPosition": "center", "transition": "slide", "overlay": "dark"})
        );
    }

    #[test]
    fn test_reel_rejects_unknown_effect_value() {
        let mut request = request_with(vec![photo("uploads/s/a.jpg", None)]);
        request.effects = Some(EffectsInput {
            overlay: Some("neon".to_string()),
            ..Default::default()
        });
        assert!(matches!(build_reel(&request), Err(RenderError::Validation(_))));
    }

    #[test]
    fn test_carousel_with_five_photos() {
        let photos = (1..=5).map(|i| photo(&format!("uploads/s/{i}.jpg"), None)).collect();
        let slides = build_carousel(&request_with(photos)).unwrap();

        assert_eq!(slides.len(), 6);
        for (i, slide) in slides.iter().enumerate() {
            assert_eq!(slide.slide_number, i + 1);
            assert_eq!(slide.base.total_slides, 6);
        }
        let names: Vec<_> = slides.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["cover", "photo1", "photo2", "photo3", "details", "cta"]);
        assert_eq!(slides[3].photo_src, "uploads/s/3.jpg");
        assert_eq!(slides[3].photo_label, "Zdjecie 3");
        assert_eq!(slides[4].photo_src, "uploads/s/1.jpg");
        assert_eq!(slides[5].photo_label, "");
    }

    #[test]
    fn test_carousel_with_single_photo() {
        let slides = build_carousel(&request_with(vec![photo("uploads/s/a.jpg", Some("Front"))])).unwrap();
        assert_eq!(slides.len(), 4);
        assert_eq!(slides[0].base.total_slides, 4);
        assert_eq!(slides[0].photo_label, "Front");
        assert_eq!(slides[1].slide_type, SlideType::Photo);
        assert_eq!(slides[1].photo_label, "Front");
    }

    #[test]
    fn test_carousel_slide_serialization() {
        let slides = build_carousel(&request_with(vec![photo("uploads/s/a.jpg", None)])).unwrap();
        let value = serde_json::to_value(&slides[0]).unwrap();
        assert_eq!(value["slideType"], "cover");
        assert_eq!(value["slideNumber"], 1);
        assert_eq!(value["totalSlides"], 4);
        assert_eq!(value["photoSrc"], "uploads/s/a.jpg");
        assert_eq!(value["title"], DEFAULT_TITLE);
        assert!(value.get("name").is_none());
        assert!(value.get("brand").is_none());
    }

    #[test]
    fn test_sold_uses_first_photo() {
        let props = build_sold(&request_with(vec![
            photo("uploads/s/a.jpg", None),
            photo("uploads/s/b.jpg", None),
        ]))
        .unwrap();
        assert_eq!(props.photo_src, "uploads/s/a.jpg");
        assert_eq!(props.title, "");
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(value["agent"], "Anna");
        assert!(value.get("brand").is_none());
    }

    #[test]
    fn test_empty_photos_rejected() {
        let request = request_with(Vec::new());
        for template in Template::ALL {
            let err = render_jobs(*template, &request).unwrap_err();
            assert!(matches!(err, RenderError::Validation(ref m) if m == NO_PHOTOS));
        }
    }

    #[test]
    fn test_render_jobs() {
        let request = request_with(vec![photo("uploads/s/a.jpg", None)]);

        let jobs = render_jobs(Template::Reel, &request).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].mode, RenderMode::Render);
        assert_eq!(jobs[0].composition, "RealEstateReel");

        let jobs = render_jobs(Template::Carousel, &request).unwrap();
        assert_eq!(jobs.len(), 4);
        assert!(jobs.iter().all(|j| j.mode == RenderMode::Still));
        assert_eq!(jobs[3].name, "cta");
        assert_eq!(jobs[3].props["slideNumber"], 4);

        let jobs = render_jobs(Template::Sold, &request).unwrap();
        assert_eq!(jobs[0].composition, "SoldVideo");
    }
}
