//! Identifier types shared across the storeview crates.
//!
//! Everything the store logs is keyed by fixed-width byte strings, so most of
//! these are aliases of [`HexString`] with a specific length.

mod hex_string;

pub use hex_string::HexString;

/// Table resource ids are always 32 bytes.
pub type TableId = HexString<[u8; 32]>;

/// A generic 32-byte store key or entity id.
pub type Bytes32 = HexString<[u8; 32]>;

/// Material identifiers are 14 bytes.
pub type MaterialId = HexString<[u8; 14]>;

/// A combination id is a keccak-256 digest, so always 32 bytes.
pub type CombinationId = HexString<[u8; 32]>;

/// Account addresses are 20 bytes long.
pub type Address = HexString<[u8; 20]>;

/// Widens an address into the store's 32-byte entity id width by
/// left-padding it with zero bytes. The store keys pods by the carrying
/// account's address in this padded form.
pub fn address_to_entity_id(address: &Address) -> Bytes32 {
    let mut id = [0u8; 32];
    id[12..].copy_from_slice(address.as_bytes());
    HexString(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_pads_to_entity_id_width() {
        let address: Address = "0x4ab7e8b94347cb0236e3de126db9c50599f7db2d"
            .parse()
            .unwrap();

        assert_eq!(
            address_to_entity_id(&address).to_string(),
            "0x0000000000000000000000004ab7e8b94347cb0236e3de126db9c50599f7db2d"
        );
    }
}
