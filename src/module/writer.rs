//! Serialization of a [`Module`] back into a PE image.
//!
//! The metadata layout never changes when accessibility is widened: the flag columns have a
//! fixed width, so the writer copies the original image and patches those columns in place.
//! Every other byte, including signatures, IL bodies, resources and any strong-name signature
//! blob, is preserved. The PE checksum is recomputed only when the original image carried one.

use std::{fs, io::Write, path::Path};

use log::debug;

use crate::{
    file::{io::write_le_at, pe_checksum},
    module::Module,
    Error, Result,
};

pub(crate) fn serialize(module: &Module) -> Result<Vec<u8>> {
    let mut data = module.file.data().to_vec();
    let mut patched = 0_usize;

    for ty in &module.types {
        let mut offset = ty.flags_offset();
        write_le_at(&mut data, &mut offset, ty.flags())?;
        patched += 1;

        for member in ty.methods.iter().chain(ty.fields.iter()) {
            let mut offset = member.flags_offset();
            write_le_at(&mut data, &mut offset, member.flags())?;
            patched += 1;
        }
    }

    if module.file.checksum() != 0 {
        let checksum_offset = module.file.checksum_offset();
        let checksum = pe_checksum(&data, checksum_offset);
        write_le_at(&mut data, &mut checksum_offset.clone(), checksum)?;
        debug!("Recomputed PE checksum 0x{:08x}", checksum);
    }

    debug!("Patched {} flag columns", patched);
    Ok(data)
}

/// Writes `data` to a temporary file next to `path` and renames it over `path`.
///
/// The result keeps the permissions of a replaced target. A new file gets the same mode a
/// plain `File::create` would give it.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".publicizer-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // subject to the umask, like any other create
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut temp = builder.tempfile_in(directory)?;

    temp.write_all(data)?;
    if let Ok(existing) = fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|error| Error::FileError(error.error))?;

    Ok(())
}
