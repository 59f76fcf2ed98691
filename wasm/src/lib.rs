//! WebAssembly module for the Bar Stock Manager single-page app
//!
//! Exposes the shared rules so the browser applies exactly what the API
//! enforces:
//! - Route guard for the navigation menu
//! - Custom ID generation
//! - Signed stock deltas for movement previews
//! - Stock count adjustments

use rust_decimal::Decimal;
use serde_json::json;
use shared::{
    compose_custom_id, ledger, parse_route_keys, Direction, MemberRole, MovementType, Quantity,
    RouteKey,
};
use std::str::FromStr;
use wasm_bindgen::prelude::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("bar-stock-wasm loaded"));
}

fn js_error(message: String) -> JsValue {
    JsValue::from_str(&message)
}

/// Whether a member may open `route_key`.
///
/// `allowed_routes_json` is the member's allow-list as stored on the server:
/// a JSON array of route keys, or `null` for unrestricted access.
#[wasm_bindgen]
pub fn is_route_allowed(role: &str, allowed_routes_json: &str, route_key: &str) -> Result<bool, JsValue> {
    route_allowed(role, allowed_routes_json, route_key).map_err(js_error)
}

fn route_allowed(role: &str, allowed_routes_json: &str, route_key: &str) -> Result<bool, String> {
    let role = MemberRole::from_str(role).map_err(|e| e.to_string())?;
    let route = RouteKey::from_str(route_key).map_err(|e| e.to_string())?;
    let raw: Option<Vec<String>> = serde_json::from_str(allowed_routes_json)
        .map_err(|e| format!("Invalid allowed routes JSON: {}", e))?;

    let allowed = raw.map(|routes| parse_route_keys(routes.iter().map(String::as_str)));
    Ok(shared::is_route_allowed(role, allowed.as_deref(), route))
}

/// A fresh custom ID from the browser's RNG and clock
#[wasm_bindgen]
pub fn generate_custom_id() -> String {
    compose_custom_id(
        |len| (js_sys::Math::random() * len as f64) as usize,
        js_sys::Date::now() as u64,
    )
}

/// Signed stock change of a movement, as a decimal string.
///
/// `direction` is only read for adjustments (`"in"` or `"out"`).
#[wasm_bindgen]
pub fn signed_delta(movement_type: &str, direction: Option<String>, quantity: &str) -> Result<String, JsValue> {
    delta(movement_type, direction.as_deref(), quantity).map_err(js_error)
}

fn delta(movement_type: &str, direction: Option<&str>, quantity: &str) -> Result<String, String> {
    let movement_type = MovementType::from_str(movement_type).map_err(|e| e.to_string())?;
    let direction = direction
        .filter(|d| !d.trim().is_empty())
        .map(parse_direction)
        .transpose()?;
    let quantity = Quantity::from_json(&json!(quantity)).map_err(|e| e.to_string())?;

    let direction = movement_type
        .resolve_direction(direction)
        .map_err(|e| e.to_string())?;
    Ok(direction.apply_sign(quantity.value()).to_string())
}

fn parse_direction(raw: &str) -> Result<Direction, String> {
    match raw.trim().to_lowercase().as_str() {
        "in" => Ok(Direction::In),
        "out" => Ok(Direction::Out),
        other => Err(format!("Unknown direction: {}", other)),
    }
}

/// Adjustment a stock count produces, as JSON `{type, direction, quantity}`,
/// or `null` when the count matches the registered quantity
#[wasm_bindgen]
pub fn stock_count_adjustment(registered: &str, counted: &str) -> Result<String, JsValue> {
    count_adjustment(registered, counted).map_err(js_error)
}

fn count_adjustment(registered: &str, counted: &str) -> Result<String, String> {
    let parse = |raw: &str| {
        Decimal::from_str(raw.trim()).map_err(|_| format!("Invalid quantity: {}", raw))
    };

    let adjustment =
        ledger::stock_count_adjustment(parse(registered)?, parse(counted)?).map_err(|e| e.to_string())?;

    let value = match adjustment {
        Some(adj) => json!({
            "type": adj.movement_type.as_str(),
            "direction": adj.direction.as_str(),
            "quantity": adj.quantity.value().to_string(),
        }),
        None => serde_json::Value::Null,
    };
    Ok(value.to_string())
}

/// Route key guarding a page path, or `undefined` for public pages
#[wasm_bindgen]
pub fn route_key_for_path(path: &str) -> Option<String> {
    RouteKey::from_path(path).map(|route| route.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_allowed() {
        assert_eq!(route_allowed("member", r#"["products","stock"]"#, "products"), Ok(true));
        assert_eq!(route_allowed("member", r#"["products","stock"]"#, "settings"), Ok(true));
        assert_eq!(route_allowed("member", r#"["products","stock"]"#, "reports"), Ok(false));
        assert_eq!(route_allowed("member", "null", "reports"), Ok(true));
        assert_eq!(route_allowed("owner", "[]", "ai"), Ok(true));
        assert!(route_allowed("admin", "null", "ai").is_err());
        assert!(route_allowed("member", "{}", "ai").is_err());
    }

    #[test]
    fn test_delta() {
        assert_eq!(delta("entrada", None, "20").unwrap(), "20");
        assert_eq!(delta("saida", Some("in"), "17").unwrap(), "-17");
        assert_eq!(delta("ajuste", Some("in"), "1.5").unwrap(), "1.5");
        assert_eq!(delta("ajuste", Some("out"), "2").unwrap(), "-2");
        assert!(delta("ajuste", None, "2").is_err());
        assert!(delta("entrada", None, "0").is_err());
        assert!(delta("transferencia", None, "1").is_err());
    }

    #[test]
    fn test_count_adjustment() {
        let adjustment: serde_json::Value =
            serde_json::from_str(&count_adjustment("12", "9").unwrap()).unwrap();
        assert_eq!(
            adjustment,
            json!({"type": "ajuste", "direction": "out", "quantity": "3"})
        );
        assert_eq!(count_adjustment("12", "12").unwrap(), "null");
        assert!(count_adjustment("12", "13").is_err());
        assert!(count_adjustment("12", "abc").is_err());
    }

    #[test]
    fn test_route_key_for_path() {
        assert_eq!(route_key_for_path("/products/42").as_deref(), Some("products"));
        assert_eq!(route_key_for_path("/"), Some("dashboard".to_string()));
        assert_eq!(route_key_for_path("/login"), None);
    }
}
