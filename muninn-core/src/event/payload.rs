use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known payload keys.
///
/// Payload semantics are owned by each producer/consumer pair; these
/// constants only pin the spelling of the keys both sides agree on.
pub mod keys {
    pub const SYMBOL: &str = "symbol";
    pub const LAST_PRICE: &str = "last_price";
    pub const VOLUME: &str = "volume";
    pub const TRADE_DATE: &str = "trade_date";
    pub const UPDATE_TIME: &str = "update_time";

    pub const ACTION: &str = "action";
    pub const PRICE: &str = "price";

    pub const MODULE: &str = "module";
    pub const MESSAGE: &str = "message";
}

/// Opaque key-value event payload.
///
/// A thin wrapper over a JSON object map. Consumers probe for the fields
/// they understand and ignore everything else, so producers are free to
/// attach extra context without breaking anyone downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Market data payload as delivered by a feed or replay producer.
    pub fn snapshot(
        symbol: &str,
        last_price: f64,
        volume: u64,
        trade_date: u32,
        update_time: u32,
    ) -> Self {
        let mut map = Map::new();
        map.insert(keys::SYMBOL.into(), Value::from(symbol));
        map.insert(keys::LAST_PRICE.into(), Value::from(last_price));
        map.insert(keys::VOLUME.into(), Value::from(volume));
        map.insert(keys::TRADE_DATE.into(), Value::from(trade_date));
        map.insert(keys::UPDATE_TIME.into(), Value::from(update_time));
        Self(map)
    }

    /// Payload for a `LogEvent` emitted by a pipeline component.
    pub fn log(module: &str, message: &str) -> Self {
        let mut map = Map::new();
        map.insert(keys::MODULE.into(), Value::from(module));
        map.insert(keys::MESSAGE.into(), Value::from(message));
        Self(map)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn u64_field(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
