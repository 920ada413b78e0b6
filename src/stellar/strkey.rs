//! StrKey codec
//!
//! Stellar encodes keys as `base32(version_byte || payload || crc16_xmodem_le)`.
//! Only the two key kinds a payment wallet handles are supported here:
//! ed25519 public keys (`G...`) and ed25519 secret seeds (`S...`).

use crate::core::errors::WalletError;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Length of an encoded 32-byte key (1 version + 32 payload + 2 checksum bytes).
pub const ENCODED_KEY_LEN: usize = 56;

/// Key kinds and their version bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionByte {
    /// `G...`
    AccountId = 6 << 3,
    /// `S...`
    SecretSeed = 18 << 3,
}

impl VersionByte {
    fn prefix(self) -> char {
        match self {
            VersionByte::AccountId => 'G',
            VersionByte::SecretSeed => 'S',
        }
    }
}

/// CRC16-XModem (poly 0x1021, init 0, no reflection).
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(input: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for c in input.bytes() {
        let value = ALPHABET.iter().position(|&a| a == c)? as u32;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    // leftover bits must be zero padding, otherwise the string is not canonical
    if bits >= 5 || (buffer & ((1 << bits) - 1)) != 0 {
        return None;
    }
    Some(out)
}

/// Encodes a 32-byte key with the given version byte.
pub fn encode(version: VersionByte, key: &[u8; 32]) -> String {
    let mut raw = Vec::with_capacity(35);
    raw.push(version as u8);
    raw.extend_from_slice(key);
    let crc = crc16_xmodem(&raw);
    raw.extend_from_slice(&crc.to_le_bytes());
    base32_encode(&raw)
}

/// Decodes a strkey, checking prefix, length, version byte and checksum.
pub fn decode(version: VersionByte, encoded: &str) -> Result<[u8; 32], WalletError> {
    let err = |reason: &str| match version {
        VersionByte::AccountId => WalletError::InvalidAddress(reason.to_string()),
        VersionByte::SecretSeed => WalletError::InvalidSecretKey(reason.to_string()),
    };

    if encoded.len() != ENCODED_KEY_LEN {
        return Err(err("wrong length"));
    }
    if !encoded.starts_with(version.prefix()) {
        return Err(err("wrong prefix"));
    }
    let raw = base32_decode(encoded).ok_or_else(|| err("not base32"))?;
    if raw.len() != 35 {
        return Err(err("wrong decoded length"));
    }
    if raw[0] != version as u8 {
        return Err(err("wrong version byte"));
    }
    let (body, checksum) = raw.split_at(33);
    let expected = crc16_xmodem(body).to_le_bytes();
    if checksum != expected {
        return Err(err("checksum mismatch"));
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&body[1..]);
    Ok(key)
}

/// Encodes an ed25519 public key as a `G...` account id.
pub fn encode_account_id(public_key: &[u8; 32]) -> String {
    encode(VersionByte::AccountId, public_key)
}

/// Decodes a `G...` account id into its ed25519 public key.
pub fn decode_account_id(account_id: &str) -> Result<[u8; 32], WalletError> {
    decode(VersionByte::AccountId, account_id)
}

/// Decodes an `S...` secret seed.
pub fn decode_secret_seed(seed: &str) -> Result<[u8; 32], WalletError> {
    decode(VersionByte::SecretSeed, seed)
}

/// Encodes raw seed bytes as an `S...` secret seed.
pub fn encode_secret_seed(seed: &[u8; 32]) -> String {
    encode(VersionByte::SecretSeed, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

    #[test]
    fn test_encode_zero_key() {
        assert_eq!(encode_account_id(&[0u8; 32]), ZERO_ACCOUNT);
    }

    #[test]
    fn test_encode_sequential_key() {
        let mut key = [0u8; 32];
        for (i, b) in key.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        assert_eq!(
            encode_account_id(&key),
            "GAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQTCQKRMFYYDENBWHA5DYPSABOV"
        );
        assert_eq!(
            encode_secret_seed(&key),
            "SAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQTCQKRMFYYDENBWHA5DYPSBF5K"
        );
    }

    #[test]
    fn test_decode_round_trip() {
        let key = [0xffu8; 32];
        let encoded = encode_account_id(&key);
        assert_eq!(encoded, "GD7777777777777777777777777777777777777777777777777773DB");
        assert_eq!(decode_account_id(&encoded).unwrap(), key);
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let tampered = ZERO_ACCOUNT.replace("WHF", "WHG");
        assert!(matches!(
            decode_account_id(&tampered),
            Err(WalletError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_decode_rejects_seed_as_account() {
        let seed = "SADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP54X";
        assert!(decode_account_id(seed).is_err());
        assert_eq!(decode_secret_seed(seed).unwrap(), [7u8; 32]);
    }

    #[test]
    fn test_decode_rejects_lowercase() {
        assert!(decode_account_id(&ZERO_ACCOUNT.to_lowercase()).is_err());
    }

    #[test]
    fn test_crc16_known_value() {
        // standard XModem check value
        assert_eq!(crc16_xmodem(b"123456789"), 0x31c3);
    }
}
