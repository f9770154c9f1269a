//! In-memory representation of a classic CAN frame as exchanged with the
//! controller and the frame queue.
use crate::error::FrameError;
use crate::transport::id::FrameId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw CAN frame as it crosses the controller boundary.
pub struct Frame {
    /// Network identifier stored inside a `u32`.
    pub id: FrameId,
    /// Whether the identifier uses the 29-bit extended format.
    pub extended: bool,
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub dlc: u8,
    /// Payload buffer. Bytes beyond `dlc` carry no meaning and must not
    /// be interpreted.
    pub payload: [u8; 8],
}

impl Frame {
    /// All-zero placeholder used to initialize queue storage.
    pub const EMPTY: Self = Self {
        id: FrameId(0),
        extended: true,
        dlc: 0,
        payload: [0; 8],
    };

    /// Build an extended data frame from a payload slice.
    ///
    /// Rejects payloads longer than eight bytes.
    pub fn new(id: FrameId, data: &[u8]) -> Result<Self, FrameError> {
        if data.len() > 8 {
            return Err(FrameError::PayloadTooLong);
        }
        let mut payload = [0u8; 8];
        payload[..data.len()].copy_from_slice(data);
        Ok(Self {
            id,
            extended: true,
            dlc: data.len() as u8,
            payload,
        })
    }

    /// Immutable view over the meaningful payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.payload[..usize::from(self.dlc.min(8))]
    }
}

// Interoperability with HAL drivers built on the `embedded-can` traits.
// Remote frames never appear on this network, so `new_remote` declines.
impl embedded_can::Frame for Frame {
    fn new(id: impl Into<embedded_can::Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let (raw, extended) = match id.into() {
            embedded_can::Id::Extended(id) => (id.as_raw(), true),
            embedded_can::Id::Standard(id) => (u32::from(id.as_raw()), false),
        };
        let mut payload = [0u8; 8];
        payload[..data.len()].copy_from_slice(data);
        Some(Self {
            id: FrameId(raw),
            extended,
            dlc: data.len() as u8,
            payload,
        })
    }

    fn new_remote(_id: impl Into<embedded_can::Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.extended
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> embedded_can::Id {
        if self.extended {
            // raw() is masked to the 29 valid bits.
            embedded_can::Id::Extended(unsafe {
                embedded_can::ExtendedId::new_unchecked(self.id.raw())
            })
        } else {
            embedded_can::Id::Standard(unsafe {
                embedded_can::StandardId::new_unchecked((self.id.raw() & 0x7FF) as u16)
            })
        }
    }

    fn dlc(&self) -> usize {
        usize::from(self.dlc)
    }

    fn data(&self) -> &[u8] {
        Frame::data(self)
    }
}
