use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque key of a tracked protocol (e.g. `"aegis"`). Never mutated once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolIdentifier(String);

impl ProtocolIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identifier for a protocol created through the admin view.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProtocolIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Management record for a protocol, edited through local CRUD only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub id: ProtocolIdentifier,
    pub name: String,
    pub symbol: String,
    pub tvl_usd: f64,
    pub collateral_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProtocol {
    pub name: String,
    pub symbol: String,
    pub tvl_usd: f64,
    pub collateral_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProtocol {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub tvl_usd: Option<f64>,
    pub collateral_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolSort {
    Tvl,
    Collateral,
}

impl Protocol {
    pub fn new(create_protocol: CreateProtocol) -> Self {
        Self {
            id: ProtocolIdentifier::generate(),
            name: create_protocol.name,
            symbol: create_protocol.symbol,
            tvl_usd: create_protocol.tvl_usd,
            collateral_ratio: create_protocol.collateral_ratio.unwrap_or(150.0),
        }
    }

    /// Apply an edit, keeping the identifier.
    pub fn apply(&mut self, update: UpdateProtocol) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(symbol) = update.symbol {
            self.symbol = symbol;
        }
        if let Some(tvl_usd) = update.tvl_usd {
            self.tvl_usd = tvl_usd;
        }
        if let Some(collateral_ratio) = update.collateral_ratio {
            self.collateral_ratio = collateral_ratio;
        }
    }

    /// Case-insensitive substring match over `"name symbol"`.
    pub fn matches(&self, query: &str) -> bool {
        format!("{} {}", self.name, self.symbol)
            .to_lowercase()
            .contains(&query.to_lowercase())
    }
}

/// Protocols the dashboard tracks before any admin edits.
pub fn seed_protocols() -> Vec<Protocol> {
    [
        ("aegis", "Aegis Finance", "AEG", 124_500_000.0, 165.0),
        ("novalend", "NovaLend", "NOVA", 76_200_000.0, 132.0),
        ("orbitx", "OrbitX", "ORBX", 210_000_000.0, 185.0),
        ("synthia", "Synthia", "SYN", 58_400_000.0, 148.0),
    ]
    .into_iter()
    .map(|(id, name, symbol, tvl_usd, collateral_ratio)| Protocol {
        id: ProtocolIdentifier::new(id),
        name: name.to_string(),
        symbol: symbol.to_string(),
        tvl_usd,
        collateral_ratio,
    })
    .collect()
}
