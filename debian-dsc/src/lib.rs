// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian source description parsing and validation.

A Debian source description (`.dsc` file) declares a source package's metadata and
enumerates the files making up its source tree, each with one or more digests. This
crate reads such a file, optionally unwrapping a PGP envelope, and verifies that the
files it references exist alongside it with the claimed content.

The canonical home of this crate is <https://github.com/indygreg/PyOxidizer>. Please file issues
and pull requests there.

# A Tour of Functionality

[source_description::DebianSourceDescription] is the main entry point. It is bound to
a path and computes everything else lazily:

```no_run
use debian_dsc::source_description::DebianSourceDescription;

let dsc = DebianSourceDescription::new("/srv/pool/z/zstd/libzstd_1.4.8+dfsg-3.dsc")?;

println!("{} {}", dsc.source()?, dsc.version_str()?);

for path in dsc.missing_files()? {
    println!("missing: {}", path.display());
}

for (path, digest) in dsc.corrected_checksums()?.iter() {
    println!("{} should be {}", path.display(), digest);
}

dsc.validate()?;
# Ok::<(), debian_dsc::error::DscError>(())
```

The lower level building blocks are exposed as well:

* [envelope] recovers text from PGP cleartext signatures and OpenPGP messages.
* [control] parses control paragraphs, retaining the exact layout of field values.
* [file_list] parses `Files` and `Checksums-*` fields.
* [self_reference] adds entries for the `.dsc` file itself to those fields.
* [checksums] indexes claimed digests by algorithm and absolute path.
* [source_files] resolves the `Files` manifest against the filesystem.
* [validation] recomputes digests, in parallel, and reports mismatches.
* [digest] computes streaming content digests.

PGP signatures are parsed but never verified.
*/

pub mod checksums;
pub mod control;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod file_list;
pub mod self_reference;
pub mod source_description;
pub mod source_files;
pub mod validation;
