/// Shader variable to buffer role mapping used when building render units.
///
/// Each entry says "shader variable `var_name` reads the buffer the model
/// calls `buffer_role`". Entries keep insertion order; that order is the
/// order attributes are enabled at draw time.

/// One (shader variable, buffer role) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMapEntry {
    pub var_name: String,
    pub buffer_role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<AttributeMapEntry>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map shader variable `var_name` to buffer role `buffer_role`
    ///
    /// Mapping the same variable again replaces its role in place.
    pub fn add(&mut self, var_name: impl Into<String>, buffer_role: impl Into<String>) -> &mut Self {
        let var_name = var_name.into();
        let buffer_role = buffer_role.into();
        match self.entries.iter_mut().find(|e| e.var_name == var_name) {
            Some(entry) => entry.buffer_role = buffer_role,
            None => self.entries.push(AttributeMapEntry { var_name, buffer_role }),
        }
        self
    }

    /// Builder-style `add`
    pub fn with(mut self, var_name: impl Into<String>, buffer_role: impl Into<String>) -> Self {
        self.add(var_name, buffer_role);
        self
    }

    /// Buffer role feeding `var_name`
    pub fn role_for(&self, var_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.var_name == var_name)
            .map(|e| e.buffer_role.as_str())
    }

    pub fn contains_var(&self, var_name: &str) -> bool {
        self.role_for(var_name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeMapEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
