//! Minimal Stellar XDR codec
//!
//! Covers exactly what a native-asset payment needs: a `TransactionV1Envelope`
//! holding one or more `Payment` operations, optional time bounds and a
//! text/id memo. Anything else found while decoding is reported as
//! unsupported rather than skipped.

use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::core::errors::WalletError;

pub const ENVELOPE_TYPE_TX: u32 = 2;

const KEY_TYPE_ED25519: u32 = 0;
const PRECOND_NONE: u32 = 0;
const PRECOND_TIME: u32 = 1;
const MEMO_NONE: u32 = 0;
const MEMO_TEXT: u32 = 1;
const MEMO_ID: u32 = 2;
const OP_PAYMENT: u32 = 1;
const ASSET_TYPE_NATIVE: u32 = 0;

const MAX_MEMO_TEXT: usize = 28;
const MAX_OPERATIONS: usize = 100;
const MAX_SIGNATURES: usize = 20;

fn unsupported(what: &str) -> WalletError {
    WalletError::SerializationError(format!("unsupported XDR: {}", what))
}

/// Big-endian, 4-byte aligned writer.
#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_fixed_opaque(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        self.pad(data.len());
    }

    pub fn write_var_opaque(&mut self, data: &[u8]) {
        self.write_u32(data.len() as u32);
        self.write_fixed_opaque(data);
    }

    fn pad(&mut self, len: usize) {
        let padding = (4 - len % 4) % 4;
        self.buf.extend(std::iter::repeat(0u8).take(padding));
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reader over a complete XDR buffer.
#[derive(Debug)]
pub struct XdrReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WalletError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| WalletError::SerializationError("unexpected end of XDR".to_string()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_u32(&mut self) -> Result<u32, WalletError> {
        let mut b = [0u8; 4];
        b.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(b))
    }

    pub fn read_u64(&mut self) -> Result<u64, WalletError> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(b))
    }

    pub fn read_i64(&mut self) -> Result<i64, WalletError> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8)?);
        Ok(i64::from_be_bytes(b))
    }

    pub fn read_fixed_opaque(&mut self, len: usize) -> Result<&'a [u8], WalletError> {
        let data = self.take(len)?;
        let padding = self.take((4 - len % 4) % 4)?;
        if padding.iter().any(|b| *b != 0) {
            return Err(WalletError::SerializationError(
                "non-zero XDR padding".to_string(),
            ));
        }
        Ok(data)
    }

    pub fn read_var_opaque(&mut self, max: usize) -> Result<&'a [u8], WalletError> {
        let len = self.read_u32()? as usize;
        if len > max {
            return Err(WalletError::SerializationError(format!(
                "XDR length {} exceeds limit {}",
                len, max
            )));
        }
        self.read_fixed_opaque(len)
    }

    fn read_key(&mut self) -> Result<[u8; 32], WalletError> {
        let mut key = [0u8; 32];
        key.copy_from_slice(self.read_fixed_opaque(32)?);
        Ok(key)
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Memo {
    None,
    Text(String),
    Id(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    /// 0 means no upper bound.
    pub max_time: u64,
}

/// Native-asset payment operation without its own source account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOp {
    pub destination: [u8; 32],
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source_account: [u8; 32],
    pub fee: u32,
    pub sequence: i64,
    pub time_bounds: Option<TimeBounds>,
    pub memo: Memo,
    pub operations: Vec<PaymentOp>,
}

fn write_muxed_account(w: &mut XdrWriter, key: &[u8; 32]) {
    w.write_u32(KEY_TYPE_ED25519);
    w.write_fixed_opaque(key);
}

fn read_muxed_account(r: &mut XdrReader<'_>) -> Result<[u8; 32], WalletError> {
    match r.read_u32()? {
        KEY_TYPE_ED25519 => r.read_key(),
        other => Err(unsupported(&format!("account type {}", other))),
    }
}

impl Transaction {
    pub fn write_xdr(&self, w: &mut XdrWriter) {
        write_muxed_account(w, &self.source_account);
        w.write_u32(self.fee);
        w.write_i64(self.sequence);

        match &self.time_bounds {
            None => w.write_u32(PRECOND_NONE),
            Some(tb) => {
                w.write_u32(PRECOND_TIME);
                w.write_u64(tb.min_time);
                w.write_u64(tb.max_time);
            }
        }

        match &self.memo {
            Memo::None => w.write_u32(MEMO_NONE),
            Memo::Text(text) => {
                w.write_u32(MEMO_TEXT);
                w.write_var_opaque(text.as_bytes());
            }
            Memo::Id(id) => {
                w.write_u32(MEMO_ID);
                w.write_u64(*id);
            }
        }

        w.write_u32(self.operations.len() as u32);
        for op in &self.operations {
            // no per-operation source account
            w.write_u32(0);
            w.write_u32(OP_PAYMENT);
            write_muxed_account(w, &op.destination);
            w.write_u32(ASSET_TYPE_NATIVE);
            w.write_i64(op.amount);
        }

        // ext v0
        w.write_u32(0);
    }

    pub fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, WalletError> {
        let source_account = read_muxed_account(r)?;
        let fee = r.read_u32()?;
        let sequence = r.read_i64()?;

        let time_bounds = match r.read_u32()? {
            PRECOND_NONE => None,
            PRECOND_TIME => Some(TimeBounds {
                min_time: r.read_u64()?,
                max_time: r.read_u64()?,
            }),
            other => return Err(unsupported(&format!("precondition type {}", other))),
        };

        let memo = match r.read_u32()? {
            MEMO_NONE => Memo::None,
            MEMO_TEXT => {
                let bytes = r.read_var_opaque(MAX_MEMO_TEXT)?;
                Memo::Text(String::from_utf8(bytes.to_vec()).map_err(|_| {
                    WalletError::SerializationError("memo text is not UTF-8".to_string())
                })?)
            }
            MEMO_ID => Memo::Id(r.read_u64()?),
            other => return Err(unsupported(&format!("memo type {}", other))),
        };

        let op_count = r.read_u32()? as usize;
        if op_count > MAX_OPERATIONS {
            return Err(WalletError::SerializationError(format!(
                "{} operations exceeds limit {}",
                op_count, MAX_OPERATIONS
            )));
        }
        let mut operations = Vec::with_capacity(op_count);
        for _ in 0..op_count {
            if r.read_u32()? != 0 {
                return Err(unsupported("operation source account"));
            }
            let op_type = r.read_u32()?;
            if op_type != OP_PAYMENT {
                return Err(unsupported(&format!("operation type {}", op_type)));
            }
            let destination = read_muxed_account(r)?;
            let asset_type = r.read_u32()?;
            if asset_type != ASSET_TYPE_NATIVE {
                return Err(unsupported(&format!("asset type {}", asset_type)));
            }
            operations.push(PaymentOp {
                destination,
                amount: r.read_i64()?,
            });
        }

        if r.read_u32()? != 0 {
            return Err(unsupported("transaction extension"));
        }

        Ok(Self {
            source_account,
            fee,
            sequence,
            time_bounds,
            memo,
            operations,
        })
    }

    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        self.write_xdr(&mut w);
        w.into_bytes()
    }

    /// Hash that gets signed and that the network reports back.
    pub fn hash(&self, network_passphrase: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(network_id(network_passphrase));
        hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
        hasher.update(self.to_xdr());
        hasher.finalize().into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    /// Last four bytes of the signing public key.
    pub hint: [u8; 4],
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    pub tx: Transaction,
    pub signatures: Vec<DecoratedSignature>,
}

impl TransactionEnvelope {
    pub fn unsigned(tx: Transaction) -> Self {
        Self {
            tx,
            signatures: Vec::new(),
        }
    }

    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.write_u32(ENVELOPE_TYPE_TX);
        self.tx.write_xdr(&mut w);
        w.write_u32(self.signatures.len() as u32);
        for sig in &self.signatures {
            w.write_fixed_opaque(&sig.hint);
            w.write_var_opaque(&sig.signature);
        }
        w.into_bytes()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.to_xdr())
    }

    pub fn from_xdr(data: &[u8]) -> Result<Self, WalletError> {
        let mut r = XdrReader::new(data);
        let envelope_type = r.read_u32()?;
        if envelope_type != ENVELOPE_TYPE_TX {
            return Err(unsupported(&format!("envelope type {}", envelope_type)));
        }
        let tx = Transaction::read_xdr(&mut r)?;

        let sig_count = r.read_u32()? as usize;
        if sig_count > MAX_SIGNATURES {
            return Err(WalletError::SerializationError(format!(
                "{} signatures exceeds limit {}",
                sig_count, MAX_SIGNATURES
            )));
        }
        let mut signatures = Vec::with_capacity(sig_count);
        for _ in 0..sig_count {
            let mut hint = [0u8; 4];
            hint.copy_from_slice(r.read_fixed_opaque(4)?);
            let signature = r.read_var_opaque(64)?.to_vec();
            signatures.push(DecoratedSignature { hint, signature });
        }

        if !r.is_empty() {
            return Err(WalletError::SerializationError(
                "trailing bytes after envelope".to_string(),
            ));
        }
        Ok(Self { tx, signatures })
    }

    pub fn from_base64(encoded: &str) -> Result<Self, WalletError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        Self::from_xdr(&bytes)
    }
}

/// `sha256(passphrase)`, the id every signature is bound to.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}
