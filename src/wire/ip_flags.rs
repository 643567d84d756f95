use bitflags::bitflags;

bitflags! {
    // Top three bits of the 16-bit flags + fragment-offset word
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IpFlags: u16 {
        const RF = 1 << 15; // reserved, must be zero
        const DF = 1 << 14; // don't fragment
        const MF = 1 << 13; // more fragments
    }
}

// Whatever the flag bits don't cover belongs to the fragment offset.
const FRAG_OFFSET_MASK: u16 = !IpFlags::all().bits();

impl IpFlags {
    /// Combine with a 13-bit fragment offset into the wire word
    pub fn pack(self, frag_offset: u16) -> u16 {
        self.bits() | (frag_offset & FRAG_OFFSET_MASK)
    }

    /// Split the wire word back into flags and fragment offset
    pub fn unpack(word: u16) -> (Self, u16) {
        (Self::from_bits_truncate(word), word & FRAG_OFFSET_MASK)
    }
}

// -- Unit tests --
