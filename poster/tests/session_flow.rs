mod support;

use std::sync::Arc;

use poster::{error::PosterError, session::PosterSession};
use shared::{CustomText, GeoPoint};

use support::fixture_service;

#[tokio::test]
async fn rendering_needs_a_location_first() {
    let (service, _) = fixture_service();
    let mut session = PosterSession::new(service);
    let err = session.preview(300).await.unwrap_err();
    assert!(matches!(err, PosterError::MissingLocation));
}

#[tokio::test]
async fn export_is_reused_until_a_setting_changes() {
    let (service, source) = fixture_service();
    let mut session = PosterSession::new(service);
    session.set_radius(500.0);
    session.set_size("square");

    let location = session.locate(Some("Paris"), None).await.unwrap();
    assert_eq!(location.city, "Paris");
    assert_eq!(source.fetch_count(), 1);

    let first = session.export().await.unwrap();
    assert_eq!((first.width, first.height), (4000, 4000));
    let again = session.export().await.unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    session.set_theme("ocean");
    assert!(session.cached_export().is_none());
    let themed = session.export().await.unwrap();
    assert!(!Arc::ptr_eq(&first, &themed));
    assert!(themed.filename.starts_with("paris_ocean_"));

    // Same theme again is not a change.
    session.set_theme("ocean");
    assert!(session.cached_export().is_some());

    session.set_custom_text(CustomText {
        title: "Ville Lumière".into(),
        ..CustomText::default()
    });
    assert!(session.cached_export().is_none());

    // None of the above needed new map data.
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn radius_change_refetches_map_data() {
    let (service, source) = fixture_service();
    let mut session = PosterSession::new(service);
    session.set_radius(800.0);
    session
        .locate(None, Some(GeoPoint::new(48.8566, 2.3522)))
        .await
        .unwrap();
    session.preview(200).await.unwrap();
    assert_eq!(source.fetch_count(), 1);

    session.set_radius(1200.0);
    assert!(session.snapshot().is_none());
    let preview = session.preview(200).await.unwrap();
    assert_eq!(preview.width, 200);
    assert_eq!(source.fetch_count(), 2);
    let bounds = session.snapshot().expect("snapshot").bounds;
    assert_eq!(bounds.radius_m, 1200.0);
}

#[tokio::test]
async fn size_change_changes_preview_shape() {
    let (service, _) = fixture_service();
    let mut session = PosterSession::new(service);
    session.set_radius(500.0);
    session.locate(Some("Paris"), None).await.unwrap();

    let portrait = session.preview(300).await.unwrap();
    assert_eq!((portrait.width, portrait.height), (300, 400));

    session.set_size("landscape");
    let landscape = session.preview(300).await.unwrap();
    assert_eq!((landscape.width, landscape.height), (300, 225));
}
