pub mod cartridge_loader;

pub use cartridge_loader::{MapperKind, load};
pub use vcs_core::prelude::*;
use vcs_core::vcs::Vcs;

/// Build a ready-to-run VCS from a raw ROM image, guessing the mapper from
/// image size (or honoring `requested` when the caller already knows it).
pub fn vcs_from_rom(rom: &[u8], requested: Option<MapperKind>) -> Result<Vcs, vcs_core::vcs::CartridgeError> {
    let cartridge = cartridge_loader::load(rom, requested)?;
    Ok(Vcs::new(cartridge))
}
