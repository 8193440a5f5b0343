/// Creates [`FormData`](crate::source::FormData) from a list of key–value pairs.
///
/// A key must be a string expression. A value is either a single string or an array / `Vec` of strings
/// (in which case all values are appended for the key, in order).
///
/// # Examples
///
/// ```
/// let form = smart_bind::form!(
///     "name": "alice",
///     "tags": ["admin", "ops"],
/// );
/// assert_eq!(form.values("name").unwrap(), ["alice"]);
/// assert_eq!(form.values("tags").unwrap(), ["admin", "ops"]);
/// ```
#[macro_export]
macro_rules! form {
    ($($key:tt : $value:expr),* $(,)?) => {
        {
            #[allow(unused_mut)]
            let mut form = $crate::source::FormData::default();
            $(
            for value in $crate::metadata::_private::IntoFormValues::into_form_values($value) {
                form.append($key, value);
            }
            )*
            form
        }
    };
}
