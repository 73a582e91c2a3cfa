//! Typed models
//!
//! [`define_model!`](crate::define_model) generates a concrete struct per
//! model with named fields, accessors and `with_*` derivation methods, plus
//! conversions to and from the dynamic [`ModelInstance`].

use crate::error::InstanceError;
use crate::instance::ModelInstance;
use crate::value::ModelValue;

/// Read a typed field out of an instance
#[doc(hidden)]
pub fn extract<T: ModelValue>(instance: &ModelInstance, name: &str) -> Result<T, InstanceError> {
    let value = instance.field(name)?;
    T::from_value(value).ok_or_else(|| InstanceError::KindMismatch {
        model: instance.model().name().to_string(),
        field: name.to_string(),
        expected: T::kind(),
        actual: value.kind_name(),
    })
}

/// Define a typed, immutable model
///
/// ```rust
/// use recordkit_model::define_model;
///
/// define_model! {
///     /// A dog and its dad
///     #[derive(Eq, Hash)]
///     pub struct Dog {
///         required {
///             name: String => with_name,
///         }
///         optional {
///             dogdad: String = "Pablo".to_string() => with_dogdad,
///         }
///     }
/// }
///
/// let rex = Dog::new("Rex");
/// assert_eq!(rex.dogdad(), "Pablo");
/// let adopted = rex.with_dogdad("Sam");
/// assert_eq!(adopted.dogdad(), "Sam");
/// assert_eq!(rex.dogdad(), "Pablo");
/// ```
///
/// The struct derives `Debug`, `Clone` and `PartialEq`; further derives go in
/// the attribute list. Every field type must implement
/// [`ModelValue`](crate::ModelValue). Default expressions are evaluated on
/// every construction that needs them. Declaring a name twice is a compile
/// error.
///
/// Generated items:
/// - `new(required...)`: optional fields take their defaults
/// - a getter per field and the named `with_*` method returning a new value
/// - `FIELDS`: names in declaration order
/// - `model_type()`: the equivalent [`ModelType`](crate::ModelType), built once
/// - `to_instance()` / `from_instance()` and `TryFrom<&ModelInstance>`
#[macro_export]
macro_rules! define_model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            required {
                $( $(#[$rmeta:meta])* $rfield:ident : $rty:ty => $rsetter:ident ),* $(,)?
            }
            optional {
                $( $(#[$ometa:meta])* $ofield:ident : $oty:ty = $odefault:expr => $osetter:ident ),* $(,)?
            }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $( $(#[$rmeta])* $rfield: $rty, )*
            $( $(#[$ometa])* $ofield: $oty, )*
        }

        #[allow(dead_code)]
        impl $name {
            /// Field names in declaration order
            pub const FIELDS: &'static [&'static str] = &[
                $( stringify!($rfield), )*
                $( stringify!($ofield), )*
            ];

            /// Create from the required fields; optional fields take their defaults
            #[allow(clippy::too_many_arguments, clippy::new_without_default)]
            #[must_use]
            pub fn new($( $rfield: impl ::core::convert::Into<$rty> ),*) -> Self {
                Self {
                    $( $rfield: $rfield.into(), )*
                    $( $ofield: $odefault, )*
                }
            }

            $(
                #[inline]
                #[must_use]
                pub fn $rfield(&self) -> &$rty {
                    &self.$rfield
                }

                #[must_use]
                pub fn $rsetter(&self, value: impl ::core::convert::Into<$rty>) -> Self {
                    let mut next = ::core::clone::Clone::clone(self);
                    next.$rfield = value.into();
                    next
                }
            )*

            $(
                #[inline]
                #[must_use]
                pub fn $ofield(&self) -> &$oty {
                    &self.$ofield
                }

                #[must_use]
                pub fn $osetter(&self, value: impl ::core::convert::Into<$oty>) -> Self {
                    let mut next = ::core::clone::Clone::clone(self);
                    next.$ofield = value.into();
                    next
                }
            )*

            /// Equivalent dynamic model type, built on first use
            ///
            /// # Errors
            /// Returns error if the field table exceeds the default builder limits
            pub fn model_type(
            ) -> ::core::result::Result<&'static $crate::ModelType, $crate::DefinitionError> {
                static MODEL: $crate::__private::OnceCell<$crate::ModelType> =
                    $crate::__private::OnceCell::new();
                MODEL.get_or_try_init(|| {
                    $crate::ModelType::builder(stringify!($name))
                        $(
                            .required_kind(
                                stringify!($rfield),
                                <$rty as $crate::ModelValue>::kind(),
                            )
                        )*
                        $(
                            .optional_with(
                                stringify!($ofield),
                                <$oty as $crate::ModelValue>::kind(),
                                || {
                                    let value: $oty = $odefault;
                                    $crate::ModelValue::into_value(value)
                                },
                            )
                        )*
                        .build()
                })
            }

            /// Convert into a dynamic instance
            ///
            /// # Errors
            /// Returns error if the model type cannot be built or a value is
            /// rejected by it
            pub fn to_instance(
                &self,
            ) -> ::core::result::Result<$crate::ModelInstance, $crate::ModelError> {
                let model = Self::model_type()?;
                let values: ::std::vec::Vec<(&'static str, $crate::Value)> = ::std::vec![
                    $(
                        (
                            stringify!($rfield),
                            $crate::ModelValue::into_value(::core::clone::Clone::clone(&self.$rfield)),
                        ),
                    )*
                    $(
                        (
                            stringify!($ofield),
                            $crate::ModelValue::into_value(::core::clone::Clone::clone(&self.$ofield)),
                        ),
                    )*
                ];
                ::core::result::Result::Ok(model.create(values)?)
            }

            /// Convert from a dynamic instance of the same model type
            ///
            /// # Errors
            /// Returns error if the instance belongs to another model type or a
            /// value does not convert to the field type
            pub fn from_instance(
                instance: &$crate::ModelInstance,
            ) -> ::core::result::Result<Self, $crate::ModelError> {
                let model = Self::model_type()?;
                if instance.model() != model {
                    return ::core::result::Result::Err($crate::InstanceError::ModelMismatch {
                        expected: ::std::string::ToString::to_string(model.name()),
                        actual: ::std::string::ToString::to_string(instance.model().name()),
                    }
                    .into());
                }
                ::core::result::Result::Ok(Self {
                    $( $rfield: $crate::__private::extract(instance, stringify!($rfield))?, )*
                    $( $ofield: $crate::__private::extract(instance, stringify!($ofield))?, )*
                })
            }
        }

        impl ::core::convert::TryFrom<&$crate::ModelInstance> for $name {
            type Error = $crate::ModelError;

            fn try_from(
                instance: &$crate::ModelInstance,
            ) -> ::core::result::Result<Self, Self::Error> {
                Self::from_instance(instance)
            }
        }
    };
}
