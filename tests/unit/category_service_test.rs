//! Unit tests for the in-memory category service.

use learnshelf::services::category_service::{CategoryServiceTrait, InMemoryCategoryService};
use learnshelf::types::category::{Category, CategoryPayload};

fn payload(name: &str) -> CategoryPayload {
    CategoryPayload {
        name: Some(name.to_string()),
        ..CategoryPayload::default()
    }
}

#[tokio::test]
async fn test_add_assigns_sequential_ids_and_defaults() {
    let service = InMemoryCategoryService::new();
    assert!(service.add(payload("Math")).await.success);
    assert!(service.add(payload("Physics")).await.success);

    let categories = service.list().await;
    assert_eq!(categories[0].id, "1");
    assert_eq!(categories[1].id, "2");
    assert_eq!(categories[0].color, "#6366f1");
    assert_eq!(categories[0].icon, "FileText");
}

#[tokio::test]
async fn test_seeded_ids_continue_after_largest() {
    let service = InMemoryCategoryService::with_categories(vec![Category {
        id: "41".to_string(),
        name: "Seed".to_string(),
        color: "#000000".to_string(),
        icon: "Book".to_string(),
    }]);
    service.add(payload("Next")).await;
    assert_eq!(service.list().await[1].id, "42");
}

#[tokio::test]
async fn test_add_rejects_blank_and_duplicate_names() {
    let service = InMemoryCategoryService::new();
    let blank = service.add(payload("  ")).await;
    assert!(!blank.success);
    assert_eq!(blank.error.as_deref(), Some("Category name is required"));

    service.add(payload("Math")).await;
    let dup = service.add(payload("MATH")).await;
    assert_eq!(dup.error.as_deref(), Some("Category already exists: MATH"));
    assert_eq!(service.list().await.len(), 1);
}

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let service = InMemoryCategoryService::new();
    service.add(payload("Math")).await;

    let result = service
        .update(
            "1",
            CategoryPayload {
                color: Some("#123456".to_string()),
                ..CategoryPayload::default()
            },
        )
        .await;
    assert!(result.success);
    let category = &service.list().await[0];
    assert_eq!(category.name, "Math");
    assert_eq!(category.color, "#123456");
}

#[tokio::test]
async fn test_update_and_delete_unknown_id_fail() {
    let service = InMemoryCategoryService::new();
    let update = service.update("9", payload("X")).await;
    assert_eq!(update.error.as_deref(), Some("Category not found: 9"));
    let delete = service.delete("9").await;
    assert_eq!(delete.error.as_deref(), Some("Category not found: 9"));
}

#[tokio::test]
async fn test_delete_removes_category() {
    let service = InMemoryCategoryService::new();
    service.add(payload("Math")).await;
    assert!(service.delete("1").await.success);
    assert!(service.list().await.is_empty());
}
