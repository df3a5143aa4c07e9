/// Integration tests for the hybrid URL contract
///
/// Each section exercises one end-to-end property through the public API:
/// round-trips, ambiguity, escaping, suffix extraction, the redirect and
/// expired-instance handling.

use hybrid_router::{
    escape_segment, extract_instance_info, unescape_segment, Delimiters, ExpiredInstancePolicy,
    InstanceInfo, InstanceStore, LogicalTarget, MemoryInstanceStore, MountCodec, MountPoint,
    MountTable, RenderDecision, RouteError, RouteRequest, ViewClass, ViewParameters,
};
use pretty_assertions::assert_eq;

fn codec(path: &str, view: &str) -> MountCodec {
    MountCodec::new(MountPoint::new(path, view).unwrap())
}

fn round_trip(codec: &MountCodec, target: &LogicalTarget, store: &MemoryInstanceStore) {
    let url = codec.encode(target, store).unwrap();
    assert!(codec.matches_path(&url), "{url} does not match its own mount");
    let decoded = codec.decode(&RouteRequest::new(url.as_str()), store).unwrap();
    assert_eq!(&decoded, target, "round-trip through {url}");
}

// ============================================================================
// Round-trip
// ============================================================================

#[test]
fn test_round_trip_fresh_targets() {
    let codec = codec("/shop/v1.0/cart", "cart");
    let store = MemoryInstanceStore::new();

    let targets = [
        LogicalTarget::fresh("cart", ViewParameters::new()),
        LogicalTarget::fresh("cart", ViewParameters::new().with("item", "42")),
        LogicalTarget::fresh(
            "cart",
            ViewParameters::new()
                .with("file", "report.final.pdf")
                .with("tag", "a")
                .with("tag", "b.c"),
        ),
        LogicalTarget::fresh("cart", ViewParameters::new().with("q", "100% / ünïcode")),
        LogicalTarget::Fresh {
            view_class: ViewClass::new("cart"),
            parameters: ViewParameters::new().with("n", "7"),
            scope_name: Some("main".to_string()),
        },
        LogicalTarget::Fresh {
            view_class: ViewClass::new("cart"),
            parameters: ViewParameters::new(),
            scope_name: Some("123".to_string()),
        },
    ];

    for target in &targets {
        round_trip(&codec, target, &store);
    }
}

#[test]
fn test_round_trip_resumed_targets() {
    let codec = codec("/page", "page");
    let store = MemoryInstanceStore::new();

    let plain = store.create("page", None, true);
    let scoped = store.create("page", Some("main".to_string()), true);
    let numeric = store.create("page", Some("123".to_string()), true);
    let advanced = store.advance_revision(&plain).unwrap();

    for key in [&plain, &scoped, &numeric, &advanced] {
        let target = codec.resumed_target(key, &store);
        round_trip(&codec, &target, &store);
    }

    assert_eq!(
        codec.encode(&codec.resumed_target(&numeric, &store), &store).unwrap(),
        "/page.123.3.0"
    );
    assert_eq!(
        codec.encode(&codec.resumed_target(&advanced, &store), &store).unwrap(),
        "/page.1.1"
    );
}

// ============================================================================
// Ambiguity between numeric scopes and ids
// ============================================================================

#[test]
fn test_numeric_scope_is_not_an_instance_id() {
    let info = InstanceInfo::scoped("123").unwrap();
    let delimiters = Delimiters::default();
    let url = format!("/mount{}", delimiters.wrap(&info));
    assert_eq!(url, "/mount..123");

    let extraction = extract_instance_info(&url, &delimiters);
    assert_eq!(extraction.url_remainder, "/mount");
    assert_eq!(extraction.instance_info, Some(info));

    // And through the codec: a fresh hit in scope "123", not instance 123
    let store = MemoryInstanceStore::new();
    let target = codec("/mount", "page")
        .decode(&RouteRequest::new(url.as_str()), &store)
        .unwrap();
    assert!(target.is_fresh());
    assert_eq!(target.scope_name(), Some("123"));
}

// ============================================================================
// Escaping
// ============================================================================

#[test]
fn test_escaping_is_reversible() {
    for segment in ["a.b", "...", ".leading", "trailing.", "_-_.", "x_--_y.z"] {
        let escaped = escape_segment(segment).unwrap();
        assert!(!escaped.contains('.'), "{escaped} still has a separator");
        assert_eq!(unescape_segment(&escaped), segment);
    }
    assert_eq!(escape_segment("no-dots").unwrap(), "no-dots");
}

#[test]
fn test_marker_lookalike_values_round_trip() {
    let codec = codec("/mount/point", "page");
    let store = MemoryInstanceStore::new();

    let target = codec
        .decode(&RouteRequest::new("/mount/point/v/a%5F-%5Fb"), &store)
        .unwrap();
    assert_eq!(
        target,
        LogicalTarget::fresh("page", ViewParameters::new().with("v", "a_-_b"))
    );
    assert_eq!(codec.encode(&target, &store).unwrap(), "/mount/point/v/a%5F-%5Fb");
    round_trip(&codec, &target, &store);

    let dotted = LogicalTarget::fresh("page", ViewParameters::new().with("v", "x_--_y.z"));
    round_trip(&codec, &dotted, &store);
}

#[test]
fn test_custom_delimiter_inside_values() {
    let delimiters = Delimiters::new("!", "").unwrap();
    let codec = codec("/m", "page").with_delimiters(delimiters);
    let store = MemoryInstanceStore::new();

    let target = LogicalTarget::fresh("page", ViewParameters::new().with("v", "x!5"));
    assert_eq!(codec.encode(&target, &store).unwrap(), "/m/v/x%215");
    round_trip(&codec, &target, &store);

    // Delimiters that parameters could spell out literally are refused
    assert!(matches!(
        Delimiters::new("~", ""),
        Err(RouteError::InvalidDelimiters { .. })
    ));
}

// ============================================================================
// Rightmost suffix
// ============================================================================

#[test]
fn test_rightmost_suffix_with_dotted_mount() {
    let extraction = extract_instance_info("/a.b/mount.3.2", &Delimiters::default());
    assert_eq!(extraction.url_remainder, "/a.b/mount");
    assert_eq!(extraction.instance_info, Some(InstanceInfo::instance(3, 2)));

    let store = MemoryInstanceStore::new();
    let codec = codec("/a.b/mount", "page");
    let key = store.create("page", None, true);
    for _ in 0..2 {
        store.advance_revision(&key);
    }
    let target = codec
        .decode(&RouteRequest::new("/a.b/mount.1.2"), &store)
        .unwrap();
    assert_eq!(target, LogicalTarget::resumed(1, 2, None, ViewParameters::new()));
}

// ============================================================================
// Trailing slashes across the redirect
// ============================================================================

#[test]
fn test_trailing_slashes_survive_redirect() {
    let codec = codec("/mount/point", "page");
    let store = MemoryInstanceStore::new();
    let path = "/mount/point/x//";

    let target = codec.decode(&RouteRequest::new(path), &store).unwrap();
    assert_eq!(
        target,
        LogicalTarget::fresh("page", ViewParameters::new().with("x", ""))
    );

    let instance = store.create("page", None, true);
    let decision = codec
        .redirect_policy()
        .on_instance_created(&codec, path, &target, &instance, &store)
        .unwrap();
    assert_eq!(decision, RenderDecision::Redirect("/mount/point/x//.1".to_string()));

    // Every later encode of the instance keeps the two slashes
    let next = store.advance_revision(&instance).unwrap();
    let url = codec.encode(&codec.resumed_target(&next, &store), &store).unwrap();
    assert_eq!(url, "/mount/point/x//.1.1");

    let resumed = codec.decode(&RouteRequest::new(url.as_str()), &store).unwrap();
    assert_eq!(
        resumed,
        LogicalTarget::resumed(1, 1, None, ViewParameters::new().with("x", ""))
    );
}

// ============================================================================
// Path matching boundary
// ============================================================================

#[test]
fn test_path_matching_boundary() {
    let codec = codec("/mount/point", "page");
    assert!(!codec.matches_path("/mount/pointXXX"));
    assert!(codec.matches_path("/mount/point.3"));
    assert!(codec.matches_path("/mount/point/sub"));
}

// ============================================================================
// Missing instances
// ============================================================================

#[test]
fn test_navigation_to_missing_instance_builds_fresh() {
    let codec = codec("/page", "page");
    let store = MemoryInstanceStore::new();

    let target = codec
        .decode(&RouteRequest::new("/page/id/9.main.5.2"), &store)
        .unwrap();
    assert_eq!(
        target,
        LogicalTarget::Fresh {
            view_class: ViewClass::new("page"),
            parameters: ViewParameters::new().with("id", "9"),
            scope_name: Some("main".to_string()),
        }
    );
}

#[test]
fn test_expired_callback_policies() {
    let store = MemoryInstanceStore::new();
    let request = RouteRequest::new("/page.5.2").from_listener(true);

    let err = codec("/page", "page").decode(&request, &store).unwrap_err();
    assert_eq!(
        err,
        RouteError::InstanceExpired {
            scope_name: None,
            view_class: ViewClass::new("page"),
        }
    );

    let reported = codec("/page", "page")
        .with_expired_policy(ExpiredInstancePolicy::Report)
        .decode(&request, &store)
        .unwrap();
    assert_eq!(
        reported,
        LogicalTarget::ExpiredInstance {
            scope_name: None,
            view_class: ViewClass::new("page"),
        }
    );

    let rebuilt = codec("/page", "page")
        .with_expired_policy(ExpiredInstancePolicy::Rebuild)
        .decode(&request, &store)
        .unwrap();
    assert_eq!(rebuilt, LogicalTarget::fresh("page", ViewParameters::new()));
}

#[test]
fn test_removed_instance_expires() {
    let codec = codec("/page", "page");
    let store = MemoryInstanceStore::new();
    let key = store.create("page", None, true);
    let url = codec.encode(&codec.resumed_target(&key, &store), &store).unwrap();

    store.remove(key.id);
    let request = RouteRequest::new(url.as_str()).from_listener(true);
    assert!(codec.decode(&request, &store).unwrap_err().is_expired());
}

// ============================================================================
// Session-unique ids
// ============================================================================

#[test]
fn test_unique_ids_drop_scope_from_urls() {
    let codec = codec("/page", "page").with_unique_instance_ids(true);
    let store = MemoryInstanceStore::new();
    let key = store.create("page", Some("side".to_string()), true);

    let target = codec.resumed_target(&key, &store);
    let url = codec.encode(&target, &store).unwrap();
    assert_eq!(url, "/page.1");

    let decoded = codec.decode(&RouteRequest::new(url.as_str()), &store).unwrap();
    assert_eq!(decoded, target);
    assert_eq!(decoded.scope_name(), Some("side"));
}

// ============================================================================
// Mount table
// ============================================================================

#[test]
fn test_table_round_trip_across_mounts() {
    let store = MemoryInstanceStore::new();
    let table = MountTable::new()
        .with_mount(codec("/docs", "docs"))
        .with_mount(codec("/docs/api", "api"));

    let key = store.create("api", None, true);
    let target = LogicalTarget::resumed(key.id, key.revision, None, ViewParameters::new());

    let url = table.encode(&target, &store).unwrap();
    assert_eq!(url, "/docs/api.1");
    assert_eq!(table.decode(&RouteRequest::new(url.as_str()), &store).unwrap(), target);

    let err = table.decode(&RouteRequest::new("/elsewhere"), &store).unwrap_err();
    assert!(err.is_not_found());
    assert!(store.is_stateful(&key));
}
