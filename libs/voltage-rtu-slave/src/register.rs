//! Caller-owned holding register store
//!
//! The slave never allocates registers. It borrows (or is handed) a store
//! covering the Modbus addresses `[base, base + len)` and translates request
//! addresses with `index = address - base`.

use std::ops::Range;

use crate::error::{Result, RtuError};

/// Holding registers at a fixed Modbus base address
#[derive(Debug)]
pub struct RegisterMap<S> {
    store: S,
    base: u16,
}

impl<S> RegisterMap<S>
where
    S: AsRef<[u16]> + AsMut<[u16]>,
{
    /// Wrap `store` so that `store[0]` answers Modbus address `base`
    pub fn new(store: S, base: u16) -> Result<Self> {
        let size = store.as_ref().len();
        if size == 0 {
            return Err(RtuError::config("Register store cannot be empty"));
        }
        if usize::from(base) + size > 0x1_0000 {
            return Err(RtuError::config(format!(
                "Register store of {} registers at base {} exceeds the 16-bit address space",
                size, base
            )));
        }

        Ok(Self { store, base })
    }

    #[inline]
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Number of registers in the store
    #[inline]
    pub fn size(&self) -> usize {
        self.store.as_ref().len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        self.store.as_ref()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u16] {
        self.store.as_mut()
    }

    /// Store index of `address`, `None` below the base address
    #[inline]
    pub fn offset(&self, address: u16) -> Option<usize> {
        address.checked_sub(self.base).map(usize::from)
    }

    /// Store indices of `quantity` registers starting at `address`
    ///
    /// `None` when any of them falls outside the store.
    pub fn span(&self, address: u16, quantity: u16) -> Option<Range<usize>> {
        let start = self.offset(address)?;
        let end = start + usize::from(quantity);
        (end <= self.size()).then_some(start..end)
    }

    /// Give the store back to the caller
    pub fn into_inner(self) -> S {
        self.store
    }
}
