//! Tests for the ad model and replication

use adsky::models::{Ad, AdError, AdKind};

fn sample_ad(interval: u32) -> Ad {
    Ad::new("skyost", AdKind::Title, "Double XP this weekend")
        .with_title("Event")
        .with_interval(interval)
        .with_expiration(1_900_000_000)
        .with_duration(5)
}

#[test]
fn test_multiply_interval_one_returns_original() {
    let ad = sample_ad(1);
    let message_ptr = ad.message.as_ptr();

    let ads = ad.multiply().unwrap();
    assert_eq!(ads.len(), 1);
    // Moved, not cloned: the heap buffer is the original's
    assert_eq!(ads[0].message.as_ptr(), message_ptr);
}

#[test]
fn test_multiply_interval_five() {
    let ad = sample_ad(5);
    let message_ptr = ad.message.as_ptr();
    let expected = ad.clone();

    let mut ads = ad.multiply().unwrap();
    assert_eq!(ads.len(), 5);
    assert!(ads.iter().all(|a| *a == expected));

    assert_eq!(ads[0].message.as_ptr(), message_ptr);
    for copy in &ads[1..] {
        assert_ne!(copy.message.as_ptr(), message_ptr);
    }

    ads[1].message = String::from("changed");
    assert_eq!(ads[0].message, "Double XP this weekend");
    assert_eq!(ads[2].message, "Double XP this weekend");
}

#[test]
fn test_copies_carry_every_field() {
    let ads = sample_ad(2).multiply().unwrap();
    let copy = &ads[1];
    assert_eq!(copy.username, "skyost");
    assert_eq!(copy.kind, AdKind::Title);
    assert_eq!(copy.title, "Event");
    assert_eq!(copy.interval, 2);
    assert_eq!(copy.expiration, 1_900_000_000);
    assert_eq!(copy.duration, 5);
}

#[test]
fn test_multiply_interval_zero_fails() {
    let err = sample_ad(0).multiply().unwrap_err();
    assert!(matches!(err, AdError::InvalidInterval { interval: 0, .. }));
    assert!(err.to_string().contains("skyost"));
}

#[test]
fn test_kinds_are_exclusive() {
    for kind in AdKind::all() {
        let ad = Ad::new("u", kind, "m");
        assert_ne!(ad.is_title(), ad.is_chat());
    }
}

#[test]
fn test_ad_list_from_json() {
    let json = r#"[
        {"username": "a", "type": 0, "title": "T", "message": "m1", "interval": 2, "expiration": 10, "duration": 3},
        {"username": "b", "type": 1, "message": "m2", "interval": 1, "expiration": 20}
    ]"#;
    let ads: Vec<Ad> = serde_json::from_str(json).unwrap();
    assert_eq!(ads.len(), 2);
    assert!(ads[0].is_title());
    assert!(ads[1].is_chat());
    assert_eq!(ads[1].title, "");
    assert_eq!(ads[1].duration, 0);
}
