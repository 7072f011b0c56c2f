//! Typed handles for the back-office resources.
//!
//! Every handle owns a clone of the [`Gateway`] and maps the generic
//! [`ListRequest`] onto the parameter names its endpoint expects.

use crate::error::ApiError;
use crate::gateway::{Gateway, RequestDescriptor};
use crate::sync::ListRequest;

pub use self::auth::{AuthApi, Credentials};
pub use self::invoices::{Invoice, InvoiceStatus, InvoiceUpdate, InvoicesApi, SessionInvoicing};
pub use self::locations::{Location, LocationsApi};
pub use self::plans::{Plan, PlanDraft, PlansApi};
pub use self::reservations::{
    Connector, CreatedReservation, Reservation, ReservationDraft, ReservationStatus,
    ReservationUpdate, ReservationsApi, StationInfo,
};
pub use self::sessions::{ChargingSession, SessionStatus, SessionsApi};
pub use self::stations::{Station, StationDraft, StationStatus, StationsApi};
pub use self::vehicles::{Vehicle, VehicleDraft, VehiclesApi};

mod auth;
mod invoices;
mod locations;
mod plans;
mod reservations;
mod sessions;
mod stations;
mod vehicles;

/// Declares a closed set of backend string values.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .find(|known| known.as_str().eq_ignore_ascii_case(value.trim()))
                    .copied()
                    .ok_or_else(|| {
                        let known: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        format!("unknown value '{value}', expected one of: {}", known.join(", "))
                    })
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Connector standard of a station outlet or a vehicle inlet.
    pub enum ConnectorType {
        Chademo => "CHAdeMO",
        Ccs => "CCS",
        Ac => "AC",
    }
}

/// How one endpoint names its list parameters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ListParams {
    /// `page` or `pageNumber`.
    pub page: &'static str,
    /// Text filters forwarded under their own names.
    pub texts: &'static [&'static str],
    /// Whether `sortBy` / `isDescending` are understood.
    pub sortable: bool,
    /// Parameter receiving the select filter, if any.
    pub status: Option<&'static str>,
}

impl ListParams {
    pub fn query(&self, request: &ListRequest) -> Vec<(String, String)> {
        let mut query = vec![
            (self.page.to_owned(), request.page.to_string()),
            ("pageSize".to_owned(), request.page_size.to_string()),
        ];

        for (field, value) in &request.texts {
            if self.texts.contains(&field.as_str()) {
                query.push((field.clone(), value.clone()));
            } else {
                tracing::debug!(field, "text filter not supported by endpoint");
            }
        }

        if let Some(sort) = request.sort.as_ref().filter(|_| self.sortable) {
            query.push(("sortBy".to_owned(), sort.field.clone()));
            query.push(("isDescending".to_owned(), sort.descending.to_string()));
        }

        if let (Some(name), Some(status)) = (self.status, request.status.as_ref()) {
            query.push((name.to_owned(), status.clone()));
        }

        query
    }

    pub fn request(&self, path: &str, request: &ListRequest) -> RequestDescriptor {
        RequestDescriptor::get(path).with_query(self.query(request))
    }
}

/// Turns a `data: false` acknowledgement into a logical failure.
pub(crate) fn confirmed(acknowledged: bool, failure: &str) -> Result<(), ApiError> {
    if acknowledged {
        Ok(())
    } else {
        Err(ApiError::Logical(failure.to_owned()))
    }
}

impl Gateway {
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn stations(&self) -> StationsApi {
        StationsApi::new(self.clone())
    }

    pub fn plans(&self) -> PlansApi {
        PlansApi::new(self.clone())
    }

    pub fn vehicles(&self) -> VehiclesApi {
        VehiclesApi::new(self.clone())
    }

    pub fn reservations(&self) -> ReservationsApi {
        ReservationsApi::new(self.clone())
    }

    pub fn invoices(&self) -> InvoicesApi {
        InvoicesApi::new(self.clone())
    }

    pub fn sessions(&self) -> SessionsApi {
        SessionsApi::new(self.clone())
    }

    pub fn locations(&self) -> LocationsApi {
        LocationsApi::new(self.clone())
    }
}
