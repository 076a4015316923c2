pub type Address = u16;
pub type Byte = u8;
pub type HalfWord = u16;
pub type Word = u32;
