/// Chain families with a dedicated safety strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Bsc,
    Solana,
    Unknown,
}

impl ChainKind {
    /// Case-insensitive, alias-aware lookup of a chain id.
    pub fn from_id(chain: &str) -> Self {
        match chain.trim().to_ascii_lowercase().as_str() {
            "bsc" | "binance" | "bnb" => Self::Bsc,
            "sol" | "solana" => Self::Solana,
            _ => Self::Unknown,
        }
    }
}
