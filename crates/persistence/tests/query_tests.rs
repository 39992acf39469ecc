//! Listing query tests: filters, combinators, ordering, pagination,
//! projections and eager loading through the repository.

mod common;

use serde_json::json;

use common::*;
use sieve_persistence::config::{MemoryBackendConfig, RepositoryConfig};
use sieve_persistence::error::{ErrorClass, QueryError, StorageError};
use sieve_persistence::repository::Repository;
use sieve_persistence::types::{
    CombinedFilter, FilterOperator, FilterSpec, GetItemsRequest, OrderSpec, PropertySelector,
    SelectSpec, Value,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn filtered(filters: CombinedFilter) -> GetItemsRequest {
    GetItemsRequest {
        combined_filters: Some(filters),
        ordered_by: Some(OrderSpec::asc("Name")),
        take: 0,
        ..Default::default()
    }
}

fn filter(property: &str, operator: FilterOperator, value: Option<&str>) -> FilterSpec {
    FilterSpec::new(property, operator, value)
}

async fn ages(ctx: &TestContext, request: &GetItemsRequest) -> Vec<i64> {
    ctx.repo
        .get_items(request, None)
        .await
        .unwrap()
        .iter()
        .filter_map(|r| r.as_entity().map(|p| p.age))
        .collect()
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test]
async fn test_name_and_age_scenario() {
    let ctx = TestContext::seeded(name_age(&[("a", 5), ("b", 15)])).await;

    let request = filtered(CombinedFilter::all(vec![
        filter("Age", FilterOperator::GreaterThan, Some("10")),
        filter("Name", FilterOperator::NotEqual, Some("a")),
    ]));
    let records = ctx.repo.get_items(&request, None).await.unwrap();

    assert_eq!(records.len(), 1);
    let person = records[0].as_entity().unwrap();
    assert_eq!((person.name.as_str(), person.age), ("b", 15));
}

#[tokio::test]
async fn test_ordering_operators_are_exact() {
    let ctx = TestContext::with_people().await;
    let by_age = |op, literal| filtered(CombinedFilter::all(vec![filter("Age", op, Some(literal))]));

    let mut ge = ages(&ctx, &by_age(FilterOperator::GreaterThanOrEqual, "35")).await;
    ge.sort();
    assert_eq!(ge, vec![35, 35, 40]);

    assert_eq!(ages(&ctx, &by_age(FilterOperator::GreaterThan, "35")).await, vec![40]);

    let mut le = ages(&ctx, &by_age(FilterOperator::LessThanOrEqual, "30")).await;
    le.sort();
    assert_eq!(le, vec![25, 30]);

    assert_eq!(ages(&ctx, &by_age(FilterOperator::LessThan, "30")).await, vec![25]);
}

#[tokio::test]
async fn test_or_is_union_and_is_intersection() {
    let ctx = TestContext::with_people().await;
    let young = filter("Age", FilterOperator::LessThan, Some("30"));
    let old = filter("Age", FilterOperator::GreaterThan, Some("35"));

    let union = ctx
        .repo
        .get_items(&filtered(CombinedFilter::any(vec![young.clone(), old.clone()])), None)
        .await
        .unwrap();
    assert_eq!(names(&union), vec!["Bob", "Carol"]);

    let intersection = ctx
        .repo
        .get_items(&filtered(CombinedFilter::all(vec![young, old])), None)
        .await
        .unwrap();
    assert!(intersection.is_empty());
}

#[tokio::test]
async fn test_single_element_combined_filter_matches_plain_filter() {
    let ctx = TestContext::with_people().await;
    let spec = filter("Name", FilterOperator::Contains, Some("o"));

    let combined = ctx
        .repo
        .get_items(&filtered(CombinedFilter::any(vec![spec.clone()])), None)
        .await
        .unwrap();
    let single = ctx
        .repo
        .get_items(
            &GetItemsRequest {
                filter: Some(spec),
                ordered_by: Some(OrderSpec::asc("Name")),
                take: 0,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(names(&combined), names(&single));
    assert_eq!(names(&combined), vec!["Bob", "Bob", "Carol"]);
}

#[tokio::test]
async fn test_combined_filters_take_precedence_over_filter() {
    let ctx = TestContext::with_people().await;
    let request = GetItemsRequest {
        filter: Some(FilterSpec::eq("Name", "Alice")),
        combined_filters: Some(CombinedFilter::all(vec![FilterSpec::eq("Name", "Dave")])),
        ..Default::default()
    };
    let records = ctx.repo.get_items(&request, None).await.unwrap();
    assert_eq!(names(&records), vec!["Dave"]);
}

#[tokio::test]
async fn test_null_tests() {
    let ctx = TestContext::with_people().await;

    let on_required = filtered(CombinedFilter::all(vec![FilterSpec::is_null("Name")]));
    assert!(ctx.repo.get_items(&on_required, None).await.unwrap().is_empty());

    let no_email = filtered(CombinedFilter::all(vec![FilterSpec::is_null("Email")]));
    let records = ctx.repo.get_items(&no_email, None).await.unwrap();
    assert_eq!(names(&records), vec!["Carol"]);

    let has_nickname = filtered(CombinedFilter::all(vec![filter(
        "nickname",
        FilterOperator::IsNotNull,
        None,
    )]));
    let records = ctx.repo.get_items(&has_nickname, None).await.unwrap();
    assert_eq!(names(&records), vec!["Carol"]);
}

#[tokio::test]
async fn test_not_equal_includes_nulls() {
    let ctx = TestContext::with_people().await;
    let request = filtered(CombinedFilter::all(vec![filter(
        "Email",
        FilterOperator::NotEqual,
        Some("alice@mail.test"),
    )]));
    let records = ctx.repo.get_items(&request, None).await.unwrap();
    assert_eq!(names(&records), vec!["Bob", "Bob", "Carol", "Dave"]);
}

#[tokio::test]
async fn test_enum_filter_accepts_name_or_ordinal() {
    let ctx = TestContext::with_people().await;

    for literal in ["suspended", "Suspended", "1"] {
        let request = filtered(CombinedFilter::all(vec![FilterSpec::eq("Status", literal)]));
        assert_eq!(ages(&ctx, &request).await, vec![35], "literal {literal}");
    }

    let request = filtered(CombinedFilter::all(vec![FilterSpec::eq("Status", "7")]));
    let err = ctx.repo.get_items(&request, None).await.unwrap_err();
    assert!(matches!(err, StorageError::Query(QueryError::InvalidValue { .. })));
}

#[tokio::test]
async fn test_binary_filter_uses_base64() {
    let ctx = TestContext::with_people().await;
    // "cG5n" is base64 for "png"
    let request = filtered(CombinedFilter::all(vec![FilterSpec::eq("Avatar", "cG5n")]));
    let records = ctx.repo.get_items(&request, None).await.unwrap();
    assert_eq!(names(&records), vec!["Carol"]);

    let malformed = filtered(CombinedFilter::all(vec![FilterSpec::eq("Avatar", "***")]));
    let err = ctx.repo.get_items(&malformed, None).await.unwrap_err();
    assert!(matches!(err, StorageError::Query(QueryError::InvalidValue { .. })));
}

// ============================================================================
// Input Errors
// ============================================================================

#[tokio::test]
async fn test_empty_combined_filter_rejected_before_backend() {
    let ctx = TestContext::with_people().await;
    let backend = CountingBackend::new(ctx.backend.clone());
    let repo: Repository<Person, _> = Repository::new(backend.clone());

    let err = repo
        .get_items(&filtered(CombinedFilter::all(vec![])), None)
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Query(QueryError::InvalidArgument { .. })));
    assert_eq!(err.class(), ErrorClass::BadRequest);
    assert_eq!(backend.acquired(), 0);
}

#[tokio::test]
async fn test_unknown_property_and_unsupported_operator() {
    let ctx = TestContext::with_people().await;

    let unknown = filtered(CombinedFilter::all(vec![FilterSpec::eq("Salary", "1")]));
    let err = ctx.repo.get_items(&unknown, None).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Query(QueryError::UnknownProperty { ref property, .. }) if property == "Salary"
    ));

    let contains_on_int = filtered(CombinedFilter::all(vec![filter(
        "Age",
        FilterOperator::Contains,
        Some("3"),
    )]));
    let err = ctx.repo.get_items(&contains_on_int, None).await.unwrap_err();
    match err {
        StorageError::Query(QueryError::UnsupportedOperator { allowed, .. }) => {
            assert!(allowed.contains("GreaterThanOrEqual"));
            assert!(!allowed.contains("Contains"));
        }
        other => panic!("expected UnsupportedOperator, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparsable_identifier_fails_closed() {
    let ctx = TestContext::with_people().await;
    let request = filtered(CombinedFilter::all(vec![FilterSpec::eq("Id", "not-a-guid")]));

    let err = ctx.repo.get_items(&request, None).await.unwrap_err();
    match err {
        StorageError::Query(QueryError::InvalidValue {
            literal,
            target_type,
            ..
        }) => {
            assert_eq!(literal.as_deref(), Some("not-a-guid"));
            assert_eq!(target_type, "Uuid");
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_literal_names_target_type() {
    let ctx = TestContext::with_people().await;
    let request = filtered(CombinedFilter::all(vec![filter(
        "Age",
        FilterOperator::GreaterThan,
        Some("ten"),
    )]));
    let err = ctx.repo.get_items(&request, None).await.unwrap_err();
    assert!(err.to_string().contains("'ten'"));
    assert!(err.to_string().contains("'Int'"));
}

// ============================================================================
// Ordering and Pagination
// ============================================================================

#[tokio::test]
async fn test_default_order_is_newest_first() {
    let ctx = TestContext::with_people().await;
    let records = ctx
        .repo
        .get_items(&GetItemsRequest::default(), None)
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["Dave", "Carol", "Bob", "Bob", "Alice"]);
}

#[tokio::test]
async fn test_default_order_can_be_disabled() {
    let ctx = TestContext::with_config(
        RepositoryConfig::default().with_default_order(false),
        MemoryBackendConfig::default(),
    );
    seed(&ctx.backend, people()).await;
    let records = ctx
        .repo
        .get_items(&GetItemsRequest::default(), None)
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["Alice", "Bob", "Bob", "Carol", "Dave"]);
}

#[tokio::test]
async fn test_explicit_descending_order() {
    let ctx = TestContext::with_people().await;
    let request = GetItemsRequest {
        ordered_by: Some(OrderSpec::desc("age")),
        take: 2,
        ..Default::default()
    };
    let records = ctx.repo.get_items(&request, None).await.unwrap();
    assert_eq!(names(&records), vec!["Carol", "Bob"]);
}

#[tokio::test]
async fn test_pagination_is_idempotent_and_concatenates() {
    let ctx = TestContext::with_people().await;
    let page = |skip, take| GetItemsRequest {
        ordered_by: Some(OrderSpec::asc("Email")),
        skip,
        take,
        ..Default::default()
    };

    let first = ctx.repo.get_items(&page(1, 2), None).await.unwrap();
    let again = ctx.repo.get_items(&page(1, 2), None).await.unwrap();
    assert_eq!(names(&first), names(&again));

    let head = ctx.repo.get_items(&page(0, 2), None).await.unwrap();
    let tail = ctx.repo.get_items(&page(2, 2), None).await.unwrap();
    let whole = ctx.repo.get_items(&page(0, 4), None).await.unwrap();

    let mut joined = names(&head);
    joined.extend(names(&tail));
    assert_eq!(joined, names(&whole));
    // nulls sort first: Carol has no email
    assert_eq!(names(&whole), vec!["Carol", "Alice", "Bob", "Bob"]);
}

#[tokio::test]
async fn test_take_zero_is_unbounded_and_max_take_caps() {
    let ctx = TestContext::with_people().await;
    let all = GetItemsRequest {
        take: 0,
        ..Default::default()
    };
    assert_eq!(ctx.repo.get_items(&all, None).await.unwrap().len(), 5);

    let capped = TestContext::with_config(
        RepositoryConfig::default().with_max_take(3),
        MemoryBackendConfig::default(),
    );
    seed(&capped.backend, people()).await;
    assert_eq!(capped.repo.get_items(&all, None).await.unwrap().len(), 3);
}

// ============================================================================
// Projection
// ============================================================================

#[tokio::test]
async fn test_projection_preserves_selector_order_and_names() {
    let ctx = TestContext::with_people().await;
    let request = GetItemsRequest {
        selector: Some(SelectSpec::of(["age", "Name"])),
        ordered_by: Some(OrderSpec::asc("Age")),
        take: 1,
        ..Default::default()
    };
    let records = ctx.repo.get_items(&request, None).await.unwrap();
    let row = records[0].as_row().unwrap();

    assert_eq!(row.keys().collect::<Vec<_>>(), vec!["age", "Name"]);
    assert_eq!(row.get("age"), Some(&Value::Int(25)));
    assert_eq!(row.get("Name"), Some(&Value::Text("Bob".to_string())));
    assert_eq!(
        serde_json::to_value(row).unwrap(),
        json!({"age": 25, "Name": "Bob"})
    );
}

#[tokio::test]
async fn test_structured_projection_decodes_documents() {
    let ctx = TestContext::with_people().await;
    let request = GetItemsRequest {
        selector: Some(
            SelectSpec::of(["Name"]).with(PropertySelector::structured("Settings")),
        ),
        ordered_by: Some(OrderSpec::asc("Name")),
        take: 0,
        ..Default::default()
    };
    let records = ctx.repo.get_items(&request, None).await.unwrap();

    let alice = records[0].as_row().unwrap();
    assert_eq!(alice.get("Settings"), Some(&Value::Null));

    let carol = records[3].as_row().unwrap();
    assert_eq!(
        carol.get("Settings"),
        Some(&Value::Json(json!({"theme": "dark", "size": 3})))
    );
}

#[tokio::test]
async fn test_structured_projection_failure_is_an_error() {
    let ctx = TestContext::seeded(vec![Person::new("Eve", 20).with_settings("{not json")]).await;
    let request = GetItemsRequest {
        selector: Some(SelectSpec::default().with(PropertySelector::structured("Settings"))),
        ..Default::default()
    };
    let err = ctx.repo.get_items(&request, None).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Query(QueryError::Projection { ref property, .. }) if property == "Settings"
    ));
}

// ============================================================================
// Eager Loading
// ============================================================================

#[tokio::test]
async fn test_includes_control_navigation_loading() {
    let ctx = TestContext::with_people().await;
    let alice = FilterSpec::eq("Name", "Alice");

    let without = GetItemsRequest {
        filter: Some(alice.clone()),
        ..Default::default()
    };
    let records = ctx.repo.get_items(&without, None).await.unwrap();
    assert!(records[0].as_entity().unwrap().addresses.is_empty());

    let with = GetItemsRequest {
        filter: Some(alice),
        includes: Some(vec!["addresses".to_string()]),
        ..Default::default()
    };
    let records = ctx.repo.get_items(&with, None).await.unwrap();
    assert_eq!(
        records[0].as_entity().unwrap().addresses,
        vec![Address {
            city: "Oslo".to_string()
        }]
    );

    // stored entity keeps its navigation
    assert_eq!(ctx.backend.snapshot()[0].addresses.len(), 1);
}

#[tokio::test]
async fn test_unknown_include_is_rejected() {
    let ctx = TestContext::with_people().await;
    let request = GetItemsRequest {
        includes: Some(vec!["Orders".to_string()]),
        ..Default::default()
    };
    let err = ctx.repo.get_items(&request, None).await.unwrap_err();
    assert!(matches!(err, StorageError::Query(QueryError::UnknownProperty { .. })));
}

#[tokio::test]
async fn test_programmatic_items_query() {
    let ctx = TestContext::with_people().await;
    let query = ctx
        .repo
        .items()
        .filter(sieve_persistence::query::build_predicate(&FilterSpec::eq("Name", "Bob")).unwrap())
        .order(sieve_persistence::query::build_order_key(&OrderSpec::desc("Age")).unwrap());
    let records = ctx.repo.query_items(query, None).await.unwrap();
    let ages: Vec<i64> = records.iter().map(|r| r.as_entity().unwrap().age).collect();
    assert_eq!(ages, vec![35, 25]);
}

#[tokio::test]
async fn test_default_take_only_sizes_programmatic_listings() {
    let ctx = TestContext::with_config(
        RepositoryConfig::default().with_default_take(2),
        MemoryBackendConfig::default(),
    );
    seed(&ctx.backend, people()).await;

    let records = ctx.repo.query_items(ctx.repo.items(), None).await.unwrap();
    assert_eq!(names(&records), vec!["Dave", "Carol"]);

    let records = ctx
        .repo
        .get_items(&GetItemsRequest::default(), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 5);

    let first = ctx.repo.first(None, None).await.unwrap().unwrap();
    assert_eq!(first.name, "Dave");
}
