#![no_std]

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Errno {
    AlreadyExists,
    Busy,
    DoesNotExist,
    InvalidArgument,
    OutOfMemory,
    OutOfRange,
}
