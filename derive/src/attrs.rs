use syn::meta::ParseNestedMeta;
use syn::{Field, LitStr, Token};

/// Everything a field's `#[conf(...)]` attributes declare.
#[derive(Debug, Default)]
pub(crate) struct FieldAttrs {
    pub(crate) key: Option<String>,
    pub(crate) default: Option<String>,
    pub(crate) flag: Option<String>,
    pub(crate) env: Option<String>,
    pub(crate) required: Option<String>,
    pub(crate) validation: Option<String>,
    pub(crate) nested: bool,
    pub(crate) embed: bool,
}

impl FieldAttrs {
    pub(crate) fn from_field(field: &Field) -> syn::Result<Self> {
        let mut attrs = FieldAttrs::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("conf") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                let slot = if meta.path.is_ident("key") {
                    &mut attrs.key
                } else if meta.path.is_ident("default") {
                    &mut attrs.default
                } else if meta.path.is_ident("flag") {
                    &mut attrs.flag
                } else if meta.path.is_ident("env") {
                    &mut attrs.env
                } else if meta.path.is_ident("validation") {
                    &mut attrs.validation
                } else if meta.path.is_ident("required") {
                    // bare `required` means "true"
                    let value = if meta.input.peek(Token![=]) {
                        string_value(&meta)?
                    } else {
                        "true".to_string()
                    };
                    return set_once(&meta, &mut attrs.required, value);
                } else if meta.path.is_ident("nested") {
                    attrs.nested = true;
                    return Ok(());
                } else if meta.path.is_ident("embed") {
                    attrs.embed = true;
                    return Ok(());
                } else {
                    return Err(meta.error(
                        "unsupported conf attribute; expected one of key, default, flag, \
                         env, required, validation, nested, embed",
                    ));
                };
                let value = string_value(&meta)?;
                set_once(&meta, slot, value)
            })?;
        }
        Ok(attrs)
    }

    /// The field is walked as a nested record. A `,squash` key implies it.
    pub(crate) fn is_record(&self) -> bool {
        self.nested
            || self.embed
            || self
                .key
                .as_deref()
                .is_some_and(|key| key.split(',').nth(1) == Some("squash"))
    }

    /// The key excludes the field from every phase.
    pub(crate) fn is_skipped(&self) -> bool {
        self.key
            .as_deref()
            .is_some_and(|key| key.split(',').next() == Some("-"))
    }
}

fn string_value(meta: &ParseNestedMeta) -> syn::Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

fn set_once(meta: &ParseNestedMeta, slot: &mut Option<String>, value: String) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate conf attribute"));
    }
    *slot = Some(value);
    Ok(())
}
