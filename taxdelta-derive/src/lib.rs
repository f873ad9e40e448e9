use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit, LitStr, Meta, Type};

/// Derive macro that describes a record struct as CSV columns.
///
/// For each named field it collects:
/// - Column name (`#[serde(rename = "...")]`, else the struct's
///   `#[serde(rename_all = "...")]` applied to the field name)
/// - Required (`#[csv(required)]`, or any field that is not `Option<T>`)
/// - Description (from doc comments)
/// - Example value (`#[csv(example = "...")]`)
///
/// Generates `csv_schema() -> &'static [CsvField]` and `csv_header() -> String`.
/// `CsvField` must be in scope where the derive is used.
#[proc_macro_derive(CsvSchema, attributes(csv))]
pub fn derive_csv_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct Column {
    name: String,
    required: bool,
    description: String,
    example: Option<String>,
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "CsvSchema only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "CsvSchema only supports structs")),
    };

    let rename_all = serde_value(&input.attrs, "rename_all")?;

    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.to_string();
        let field_name = field_name.trim_start_matches("r#");

        let name = match serde_value(&field.attrs, "rename")? {
            Some(rename) => rename,
            None => apply_rename_all(field_name, rename_all.as_deref()),
        };
        let (marked_required, example) = csv_options(&field.attrs)?;

        columns.push(Column {
            name,
            required: marked_required || !is_option_type(&field.ty),
            description: doc_comment(&field.attrs),
            example,
        });
    }

    let entries = columns.iter().map(|column| {
        let Column {
            name,
            required,
            description,
            example,
        } = column;
        let example = match example {
            Some(example) => quote! { Some(#example) },
            None => quote! { None },
        };
        quote! {
            CsvField {
                name: #name,
                required: #required,
                description: #description,
                example: #example,
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub fn csv_schema() -> &'static [CsvField] {
                static SCHEMA: &[CsvField] = &[
                    #(#entries),*
                ];
                SCHEMA
            }

            pub fn csv_header() -> String {
                Self::csv_schema()
                    .iter()
                    .map(|field| field.name)
                    .collect::<Vec<_>>()
                    .join(",")
            }
        }
    })
}

/// Parse `#[csv(required, example = "...")]`.
fn csv_options(attrs: &[Attribute]) -> syn::Result<(bool, Option<String>)> {
    let mut required = false;
    let mut example = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("csv")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("required") {
                required = true;
                Ok(())
            } else if meta.path.is_ident("example") {
                let value: LitStr = meta.value()?.parse()?;
                example = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `required` or `example = \"...\"`"))
            }
        })?;
    }
    Ok((required, example))
}

/// Find `key = "value"` inside any `#[serde(...)]` attribute, skipping the other keys.
fn serde_value(attrs: &[Attribute], key: &str) -> syn::Result<Option<String>> {
    let mut found = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) && meta.input.peek(syn::Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                found = Some(value.value());
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let _nested;
                syn::parenthesized!(_nested in meta.input);
            }
            Ok(())
        })?;
    }
    Ok(found)
}

fn apply_rename_all(field: &str, rule: Option<&str>) -> String {
    match rule {
        Some("camelCase") => {
            let pascal = to_pascal(field);
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        Some("PascalCase") => to_pascal(field),
        Some("kebab-case") => field.replace('_', "-"),
        Some("SCREAMING_SNAKE_CASE") => field.to_uppercase(),
        _ => field.to_string(),
    }
}

fn to_pascal(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            if let Meta::NameValue(meta) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &meta.value {
                    if let Lit::Str(lit_str) = &expr_lit.lit {
                        return Some(lit_str.value().trim().to_string());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_all_camel_case() {
        assert_eq!(apply_rename_all("annual_income", Some("camelCase")), "annualIncome");
        assert_eq!(apply_rename_all("age", Some("camelCase")), "age");
    }

    #[test]
    fn rename_all_other_rules() {
        assert_eq!(apply_rename_all("capital_gains", Some("kebab-case")), "capital-gains");
        assert_eq!(apply_rename_all("capital_gains", Some("PascalCase")), "CapitalGains");
        assert_eq!(apply_rename_all("capital_gains", None), "capital_gains");
    }
}
