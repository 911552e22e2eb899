pub use tgs_shared::{
    ApiError, GeoPoint, GeocodeRequest, GeocodeResponse, Lane, LanesRequest, LanesResponse,
    RouteRequest, RouteResponse, SIGN_LABEL, SignPlacement, TaperPlan, TgsPlan, TgsRequest,
    TgsResponse, WorkzoneRange,
};
