//! Encoded OpenFlow message buffers
//!
//! An `OfpBuf` is the opaque unit the codec produces and the control
//! channel carries. The client only ever touches the common 8-byte header
//! (version, type, length, xid); bodies belong to the codec.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{OfctlError, Result};
use crate::protocol::OfpVersion;

pub const OFP_HEADER_LEN: usize = 8;

/// One encoded OpenFlow message, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfpBuf {
    data: Vec<u8>,
}

impl OfpBuf {
    /// Start a message with a header and an empty body
    pub fn new(version: OfpVersion, msg_type: u8, xid: u32) -> Self {
        let mut data = vec![0u8; OFP_HEADER_LEN];
        data[0] = version.to_wire();
        data[1] = msg_type;
        BigEndian::write_u16(&mut data[2..4], OFP_HEADER_LEN as u16);
        BigEndian::write_u32(&mut data[4..8], xid);
        Self { data }
    }

    /// Wrap bytes received from the wire. Returns None if the header is truncated.
    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        if data.len() < OFP_HEADER_LEN {
            return None;
        }
        Some(Self { data })
    }

    pub fn raw_version(&self) -> u8 {
        self.data[0]
    }

    pub fn version(&self) -> Option<OfpVersion> {
        OfpVersion::from_wire(self.raw_version())
    }

    pub fn msg_type(&self) -> u8 {
        self.data[1]
    }

    /// Length as recorded in the header, which lags the buffer until
    /// `update_length` is called.
    pub fn header_length(&self) -> u16 {
        BigEndian::read_u16(&self.data[2..4])
    }

    pub fn xid(&self) -> u32 {
        BigEndian::read_u32(&self.data[4..8])
    }

    pub fn set_xid(&mut self, xid: u32) {
        BigEndian::write_u32(&mut self.data[4..8], xid);
    }

    pub fn body(&self) -> &[u8] {
        &self.data[OFP_HEADER_LEN..]
    }

    pub fn put(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, value);
        self.put(&buf);
    }

    pub fn put_u32(&mut self, value: u32) {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, value);
        self.put(&buf);
    }

    pub fn put_u64(&mut self, value: u64) {
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, value);
        self.put(&buf);
    }

    /// Rewrite the header length field from the buffer size.
    ///
    /// Codecs append body bytes without touching the header, so this must
    /// run before the message goes on the wire. A message the 16-bit field
    /// cannot describe is refused and the header is left untouched.
    pub fn update_length(&mut self) -> Result<()> {
        let len = self.data.len();
        let wire_len = u16::try_from(len).map_err(|_| OfctlError::MessageTooLong { len })?;
        BigEndian::write_u16(&mut self.data[2..4], wire_len);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
