//! Deterministic template-based mock generator.
//!
//! This is the fallback end of the provider chain: no network, no credentials,
//! always succeeds. Field sets are driven by a fixed table of resource-name
//! families; session context supplies continuity so created items reappear in
//! later LIST/GET/UPDATE requests.

use crate::classifier::{self, OperationType};
use crate::types::{default_headers, ContextEntry, MockResponse, RequestDescriptor};
use chrono::{Duration, SecondsFormat, Utc};
use fake::faker::address::en::{BuildingNumber, CityName, CountryName, StreetName};
use fake::faker::company::en::{CatchPhrase, CompanyName, Industry};
use fake::faker::internet::en::{FreeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word, Words};
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub struct SyntheticEngine;

impl SyntheticEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produce a mock response for any request, consulting session context for
    /// continuity. Infallible by design.
    pub fn generate(
        &self,
        descriptor: &RequestDescriptor,
        context: &[ContextEntry],
    ) -> MockResponse {
        let resource = classifier::extract_resource(&descriptor.path);
        let collection = classifier::is_collection(&descriptor.path);

        match classifier::operation_type(&descriptor.method, collection) {
            OperationType::List => self.list(&resource, context),
            OperationType::GetOne => self.get_one(&resource, &descriptor.path, context),
            OperationType::Create => self.create(&resource, descriptor.body.as_ref()),
            OperationType::Update => {
                self.update(&resource, &descriptor.path, descriptor.body.as_ref(), context)
            }
            OperationType::Delete => self.delete(),
            OperationType::Unknown => self.acknowledge(),
        }
    }

    /// LIST: previously created items of this resource win over fresh ones.
    fn list(&self, resource: &str, context: &[ContextEntry]) -> MockResponse {
        let created = created_from_context(resource, context);

        let items: Vec<Value> = if created.is_empty() {
            let count = rand::thread_rng().gen_range(3..=5);
            (0..count)
                .map(|i| generate_item(resource, &i.to_string()))
                .collect()
        } else {
            created
        };

        MockResponse::new(
            200,
            json!({
                resource: items,
                "total": items.len(),
                "page": 1,
                "per_page": 10,
                "has_more": false,
            }),
        )
    }

    /// GET_ONE: prefer a previously created item with a matching id.
    fn get_one(&self, resource: &str, path: &str, context: &[ContextEntry]) -> MockResponse {
        let item_id = classifier::trailing_segment(path).unwrap_or("1");

        for entry in context.iter().rev() {
            if entry.method == "POST" && entry.path.contains(resource) {
                if let Some(body) = entry.response.body.as_object() {
                    if body.get("id").and_then(Value::as_str) == Some(item_id) {
                        return MockResponse::new(200, entry.response.body.clone());
                    }
                }
            }
        }

        MockResponse::new(200, generate_item(resource, item_id))
    }

    /// CREATE: generated identity wins, caller-supplied content wins for the
    /// rest. 201 with a Location header pointing at the new resource.
    fn create(&self, resource: &str, body: Option<&Value>) -> MockResponse {
        let item = generate_item(resource, &short_id());

        let item = match body.and_then(Value::as_object) {
            Some(supplied) => {
                let mut merged = supplied.clone();
                for field in ["id", "created_at", "updated_at"] {
                    if let Some(value) = item.get(field) {
                        merged.insert(field.to_string(), value.clone());
                    }
                }
                Value::Object(merged)
            }
            None => item,
        };

        let id = item
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut headers = default_headers();
        headers.insert("Location".to_string(), format!("/{resource}/{id}"));

        MockResponse {
            status_code: 201,
            headers,
            body: item,
        }
    }

    /// UPDATE: start from the last known representation of this id when the
    /// context holds one, merge the caller's body over it, stamp updated_at.
    fn update(
        &self,
        resource: &str,
        path: &str,
        body: Option<&Value>,
        context: &[ContextEntry],
    ) -> MockResponse {
        let item_id = classifier::trailing_segment(path).unwrap_or("1");

        let existing = context.iter().rev().find_map(|entry| {
            if entry.method != "POST" && entry.method != "GET" {
                return None;
            }
            let body = entry.response.body.as_object()?;
            let references_id = entry.path.contains(item_id)
                || body.get("id").and_then(Value::as_str) == Some(item_id);
            if references_id {
                Some(body.clone())
            } else {
                None
            }
        });

        let mut item = match existing {
            Some(map) => map,
            None => generate_item(resource, item_id)
                .as_object()
                .cloned()
                .unwrap_or_default(),
        };

        if let Some(supplied) = body.and_then(Value::as_object) {
            for (k, v) in supplied {
                item.insert(k.clone(), v.clone());
            }
        }
        item.insert("updated_at".to_string(), json!(now_iso()));

        MockResponse::new(200, Value::Object(item))
    }

    /// DELETE: 204 with an empty body, regardless of path.
    fn delete(&self) -> MockResponse {
        MockResponse::new(204, json!({}))
    }

    /// Generic acknowledgement for methods outside the REST mapping.
    fn acknowledge(&self) -> MockResponse {
        MockResponse::new(
            200,
            json!({
                "message": "Mock response generated by Mirage",
                "timestamp": now_iso(),
                "provider": "synthetic",
            }),
        )
    }
}

impl Default for SyntheticEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Created items of this resource observed in the session, oldest first.
fn created_from_context(resource: &str, context: &[ContextEntry]) -> Vec<Value> {
    context
        .iter()
        .filter(|entry| entry.method == "POST" && entry.path.contains(resource))
        .filter(|entry| entry.response.body.is_object())
        .map(|entry| entry.response.body.clone())
        .collect()
}

/// Synthesize one item with identity fields plus a resource-family field set.
pub fn generate_item(resource: &str, item_id: &str) -> Value {
    let mut rng = rand::thread_rng();
    let mut item = Map::new();

    item.insert("id".to_string(), json!(item_id));
    item.insert("created_at".to_string(), json!(past_iso(&mut rng)));
    item.insert("updated_at".to_string(), json!(past_iso(&mut rng)));

    match resource.to_lowercase().as_str() {
        "users" | "user" | "accounts" | "account" | "profiles" | "profile" => {
            item.insert("name".to_string(), json!(Name().fake::<String>()));
            item.insert("email".to_string(), json!(FreeEmail().fake::<String>()));
            item.insert("username".to_string(), json!(Username().fake::<String>()));
            item.insert(
                "avatar".to_string(),
                json!(format!(
                    "https://api.dicebear.com/7.x/avataaars/svg?seed={item_id}"
                )),
            );
            item.insert("status".to_string(), json!(pick(&mut rng, &["active", "inactive", "pending"])));
            item.insert("role".to_string(), json!(pick(&mut rng, &["admin", "user", "moderator"])));
        }
        "products" | "product" | "items" | "item" | "goods" | "good" => {
            item.insert("name".to_string(), json!(CatchPhrase().fake::<String>()));
            item.insert("description".to_string(), json!(Sentence(5..12).fake::<String>()));
            item.insert("price".to_string(), json!(round2(rng.gen_range(10.0..1000.0))));
            item.insert("currency".to_string(), json!("USD"));
            item.insert("sku".to_string(), json!(sku(&mut rng)));
            item.insert("in_stock".to_string(), json!(rng.gen_bool(0.8)));
            item.insert("stock_quantity".to_string(), json!(rng.gen_range(0..=100)));
            item.insert(
                "category".to_string(),
                json!(pick(&mut rng, &["Electronics", "Clothing", "Food", "Books"])),
            );
        }
        "orders" | "order" | "purchases" | "purchase" => {
            item.insert("order_number".to_string(), json!(format!("ORD-{:08}", rng.gen_range(0..100_000_000u32))));
            item.insert("total".to_string(), json!(round2(rng.gen_range(50.0..500.0))));
            item.insert("currency".to_string(), json!("USD"));
            item.insert(
                "status".to_string(),
                json!(pick(&mut rng, &["pending", "processing", "completed", "cancelled"])),
            );
            item.insert("customer_id".to_string(), json!(tagged_id("usr")));
            item.insert("items_count".to_string(), json!(rng.gen_range(1..=5)));
            item.insert("shipping_address".to_string(), address());
        }
        "posts" | "post" | "articles" | "article" | "blog" => {
            item.insert("title".to_string(), json!(Sentence(4..8).fake::<String>()));
            item.insert("content".to_string(), json!(Paragraph(2..5).fake::<String>()));
            item.insert("author".to_string(), json!(Name().fake::<String>()));
            item.insert("author_id".to_string(), json!(tagged_id("usr")));
            item.insert("slug".to_string(), json!(slug(&mut rng)));
            item.insert("published".to_string(), json!(rng.gen_bool(0.7)));
            item.insert("views".to_string(), json!(rng.gen_range(0..=10_000)));
            item.insert("likes".to_string(), json!(rng.gen_range(0..=1_000)));
        }
        "comments" | "comment" | "reviews" | "review" => {
            item.insert("text".to_string(), json!(Sentence(8..16).fake::<String>()));
            item.insert("author".to_string(), json!(Name().fake::<String>()));
            item.insert("author_id".to_string(), json!(tagged_id("usr")));
            item.insert("rating".to_string(), json!(rng.gen_range(1..=5)));
            item.insert("likes".to_string(), json!(rng.gen_range(0..=100)));
        }
        "tasks" | "task" | "todos" | "todo" => {
            item.insert("title".to_string(), json!(Sentence(3..7).fake::<String>()));
            item.insert("description".to_string(), json!(Sentence(6..14).fake::<String>()));
            item.insert("status".to_string(), json!(pick(&mut rng, &["todo", "in_progress", "done"])));
            item.insert(
                "priority".to_string(),
                json!(pick(&mut rng, &["low", "medium", "high", "urgent"])),
            );
            item.insert("assigned_to".to_string(), json!(tagged_id("usr")));
            item.insert("due_date".to_string(), json!(future_date(&mut rng)));
        }
        "events" | "event" | "meetings" | "meeting" => {
            item.insert("title".to_string(), json!(Sentence(3..6).fake::<String>()));
            item.insert("description".to_string(), json!(Sentence(6..14).fake::<String>()));
            item.insert("start_time".to_string(), json!(future_iso(&mut rng)));
            item.insert("end_time".to_string(), json!(future_iso(&mut rng)));
            item.insert(
                "location".to_string(),
                json!(format!(
                    "{} {}, {}",
                    BuildingNumber().fake::<String>(),
                    StreetName().fake::<String>(),
                    CityName().fake::<String>()
                )),
            );
            item.insert("organizer".to_string(), json!(Name().fake::<String>()));
            item.insert("attendees_count".to_string(), json!(rng.gen_range(1..=100)));
        }
        "companies" | "company" | "organizations" | "organization" => {
            let name: String = CompanyName().fake();
            let domain = name
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>();
            item.insert("name".to_string(), json!(name));
            item.insert("industry".to_string(), json!(Industry().fake::<String>()));
            item.insert("employees_count".to_string(), json!(rng.gen_range(10..=10_000)));
            item.insert("website".to_string(), json!(format!("https://{domain}.com")));
            item.insert("email".to_string(), json!(format!("info@{domain}.com")));
            item.insert("phone".to_string(), json!(PhoneNumber().fake::<String>()));
            item.insert("address".to_string(), address());
        }
        _ => {
            let word: String = Word().fake();
            let mut name = word;
            if let Some(first) = name.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            item.insert("name".to_string(), json!(name));
            item.insert("description".to_string(), json!(Sentence(4..9).fake::<String>()));
            item.insert("status".to_string(), json!(pick(&mut rng, &["active", "inactive", "pending"])));
            item.insert("type".to_string(), json!(resource.trim_end_matches('s')));
            item.insert("value".to_string(), json!(round2(rng.gen_range(1.0..100.0))));
        }
    }

    Value::Object(item)
}

fn address() -> Value {
    json!({
        "street": format!(
            "{} {}",
            BuildingNumber().fake::<String>(),
            StreetName().fake::<String>()
        ),
        "city": CityName().fake::<String>(),
        "country": CountryName().fake::<String>(),
    })
}

fn pick<'a>(rng: &mut impl Rng, choices: &[&'a str]) -> &'a str {
    choices.choose(rng).copied().unwrap_or("")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sku(rng: &mut impl Rng) -> String {
    let letters: String = (0..3)
        .map(|_| rng.gen_range(b'A'..=b'Z') as char)
        .collect();
    format!("{letters}-{:08}", rng.gen_range(0..100_000_000u32))
}

fn slug(rng: &mut impl Rng) -> String {
    let count = rng.gen_range(2..=4);
    Words(count..count + 1)
        .fake::<Vec<String>>()
        .join("-")
        .to_lowercase()
}

/// Short underscore-tagged id, e.g. `id_4f3a9c2d`.
///
/// New items must be addressable by the paths that come back to us, so the
/// shape has to classify as an id: underscore-tagged with a guaranteed digit.
/// The hex window starts at the UUID version nibble, which is always `4`.
pub fn short_id() -> String {
    tagged_id("id")
}

fn tagged_id(tag: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{tag}_{}", &hex[12..20])
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn past_iso(rng: &mut impl Rng) -> String {
    let offset = Duration::seconds(rng.gen_range(3_600..31_536_000));
    (Utc::now() - offset).to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn future_iso(rng: &mut impl Rng) -> String {
    let offset = Duration::seconds(rng.gen_range(3_600..2_592_000));
    (Utc::now() + offset).to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn future_date(rng: &mut impl Rng) -> String {
    let offset = Duration::days(rng.gen_range(1..30));
    (Utc::now() + offset).date_naive().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(method: &str, path: &str, body: Option<Value>) -> RequestDescriptor {
        RequestDescriptor::new(method, path, body, Some("s1"))
    }

    fn created_entry(path: &str, body: Value) -> ContextEntry {
        let desc = descriptor("POST", path, None);
        let mut response = MockResponse::new(201, body);
        response
            .headers
            .insert("Location".to_string(), path.to_string());
        ContextEntry::from_exchange(&desc, &response)
    }

    #[test]
    fn test_list_synthesizes_wrapper() {
        let engine = SyntheticEngine::new();
        let resp = engine.generate(&descriptor("GET", "/api/v1/users", None), &[]);

        assert_eq!(resp.status_code, 200);
        let items = resp.body["users"].as_array().unwrap();
        assert!((3..=5).contains(&items.len()));
        assert_eq!(resp.body["total"], json!(items.len()));
        assert_eq!(resp.body["page"], json!(1));
        assert_eq!(resp.body["has_more"], json!(false));
    }

    #[test]
    fn test_list_prefers_created_items() {
        let engine = SyntheticEngine::new();
        let context = vec![
            created_entry("/users", json!({"id": "a1", "name": "Alice"})),
            created_entry("/users", json!({"id": "b2", "name": "Bob"})),
        ];

        let resp = engine.generate(&descriptor("GET", "/users", None), &context);
        let items = resp.body["users"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        // Creation order preserved
        assert_eq!(items[0]["name"], json!("Alice"));
        assert_eq!(items[1]["name"], json!("Bob"));
    }

    #[test]
    fn test_get_one_finds_created_item() {
        let engine = SyntheticEngine::new();
        let context = vec![created_entry(
            "/users",
            json!({"id": "id_4ab12cd3", "name": "Alice"}),
        )];

        let resp = engine.generate(&descriptor("GET", "/users/id_4ab12cd3", None), &context);
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body["name"], json!("Alice"));
    }

    #[test]
    fn test_created_ids_classify_as_single_items() {
        let engine = SyntheticEngine::new();
        let resp = engine.generate(
            &descriptor("POST", "/users", Some(json!({"name": "Alice"}))),
            &[],
        );

        // Follow-up requests address the new item through its id, so the id
        // must route to GET_ONE rather than a collection of that name
        let id = resp.body["id"].as_str().unwrap();
        assert!(classifier::looks_like_id(id));
        assert!(!classifier::is_collection(&format!("/users/{id}")));
        assert_eq!(classifier::extract_resource(&format!("/users/{id}")), "users");
    }

    #[test]
    fn test_get_one_synthesizes_when_unknown() {
        let engine = SyntheticEngine::new();
        let resp = engine.generate(&descriptor("GET", "/users/123", None), &[]);
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body["id"], json!("123"));
        assert!(resp.body["email"].is_string());
    }

    #[test]
    fn test_create_generated_identity_wins() {
        let engine = SyntheticEngine::new();
        let body = json!({"id": "caller-id", "name": "Alice", "created_at": "1999-01-01"});
        let resp = engine.generate(&descriptor("POST", "/users", Some(body)), &[]);

        assert_eq!(resp.status_code, 201);
        assert_ne!(resp.body["id"], json!("caller-id"));
        assert_ne!(resp.body["created_at"], json!("1999-01-01"));
        assert_eq!(resp.body["name"], json!("Alice"));

        let id = resp.body["id"].as_str().unwrap();
        assert_eq!(
            resp.headers.get("Location").map(String::as_str),
            Some(format!("/users/{id}").as_str())
        );
    }

    #[test]
    fn test_update_merges_over_context() {
        let engine = SyntheticEngine::new();
        let context = vec![created_entry(
            "/users/123",
            json!({"id": "123", "name": "Alice", "role": "user", "created_at": "2024-01-01T00:00:00Z"}),
        )];

        let resp = engine.generate(
            &descriptor("PATCH", "/users/123", Some(json!({"role": "admin"}))),
            &context,
        );

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body["role"], json!("admin"));
        assert_eq!(resp.body["name"], json!("Alice"));
        let created = resp.body["created_at"].as_str().unwrap();
        let updated = resp.body["updated_at"].as_str().unwrap();
        assert!(updated > created);
    }

    #[test]
    fn test_delete_returns_204_empty() {
        let engine = SyntheticEngine::new();
        let resp = engine.generate(&descriptor("DELETE", "/anything/at/all", None), &[]);
        assert_eq!(resp.status_code, 204);
        assert_eq!(resp.body, json!({}));
    }

    #[test]
    fn test_unknown_method_acknowledged() {
        let engine = SyntheticEngine::new();
        let resp = engine.generate(&descriptor("OPTIONS", "/users", None), &[]);
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body["provider"], json!("synthetic"));
    }

    #[test]
    fn test_category_field_sets() {
        let product = generate_item("products", "p1");
        assert!(product["price"].is_number());
        assert!(product["sku"].is_string());

        let order = generate_item("orders", "o1");
        assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));
        assert!(order["shipping_address"]["city"].is_string());

        let generic = generate_item("frobnicators", "f1");
        assert_eq!(generic["type"], json!("frobnicator"));
        assert!(generic["status"].is_string());
    }
}
