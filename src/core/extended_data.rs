/// Ein Eintrag aus einem `<ExtendedData>`-Block.
///
/// `name` stammt aus dem `name`-Attribut von `<Data>`, `display_name` und
/// `value` aus den gleichnamigen Unter-Tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedData {
    pub name: String,
    pub display_name: String,
    pub value: String,
}

impl ExtendedData {
    /// Erstellt einen vollständigen Eintrag
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            value: value.into(),
        }
    }

    /// Anzeigename, ersatzweise der technische Name
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}
