use std::collections::HashMap;
use toy::ToyAssemblyError;

/// Tracks label definitions and the back-patch sites that reference them across
/// a single assembly pass. Every reference is resolved in one fixup sweep after
/// the whole source has been translated.
#[derive(Default)]
pub struct LabelTable {
    labels: HashMap<String, u16>,
    patch_sites: HashMap<String, Vec<usize>>,
}

impl LabelTable {
    pub fn new() -> LabelTable {
        LabelTable::default()
    }

    pub fn define(&mut self, name: &str, address: u16) -> Result<(), ToyAssemblyError> {
        if self.labels.contains_key(name) {
            return Err(ToyAssemblyError::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), address);
        Ok(())
    }

    /// Records that `machine_code[index]`'s low byte must be OR-ed with the
    /// resolved address of `name` once it is known.
    pub fn reference(&mut self, name: &str, index: usize) {
        self.patch_sites
            .entry(name.to_string())
            .or_insert_with(Vec::new)
            .push(index);
    }

    pub fn resolved(&self, name: &str) -> Option<u16> {
        self.labels.get(name).copied()
    }

    /// Applies every recorded back-patch, OR-ing each site's low byte with the
    /// label's resolved address. Fails on the first label with no definition.
    pub fn fixup(&self, machine_code: &mut [u16]) -> Result<(), ToyAssemblyError> {
        for (name, sites) in &self.patch_sites {
            let address = self
                .labels
                .get(name)
                .ok_or_else(|| ToyAssemblyError::UnresolvedLabel(name.clone()))?;

            for &index in sites {
                machine_code[index] |= address & 0xFF;
            }
        }
        Ok(())
    }

    pub fn into_map(self) -> HashMap<String, u16> {
        self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_definition_is_an_error() {
        let mut table = LabelTable::new();
        table.define("start", 0).unwrap();
        assert!(table.define("start", 4).is_err());
    }

    #[test]
    fn unresolved_reference_fails_fixup() {
        let mut table = LabelTable::new();
        table.reference("missing", 0);
        let mut code = vec![0u16];
        assert!(table.fixup(&mut code).is_err());
    }

    #[test]
    fn fixup_patches_low_byte() {
        let mut table = LabelTable::new();
        table.define("end", 0x2A).unwrap();
        table.reference("end", 0);
        let mut code = vec![0x7000u16];
        table.fixup(&mut code).unwrap();
        assert_eq!(code[0], 0x702A);
    }
}
