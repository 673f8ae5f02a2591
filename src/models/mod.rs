pub mod listing;

pub use listing::{
    parse_displacement, CreatedListing, FavoriteResponse, FavoriteStatus, Listing, ListingDetails,
    ListingId, ListingResponse, NewListing, Photo, PriceBadge, PriceBrackets, SellerSummary, UserId,
    UserProfile,
};
