//! KML element and attribute names used by the reader and writer.
#![allow(missing_docs)]

pub const KML_NS: &str = "http://www.opengis.net/kml/2.2";

pub const KML: &str = "kml";
pub const DOCUMENT: &str = "Document";
pub const FOLDER: &str = "Folder";
pub const PLACEMARK: &str = "Placemark";
pub const NETWORK_LINK: &str = "NetworkLink";
pub const GROUND_OVERLAY: &str = "GroundOverlay";
pub const SCHEMA: &str = "Schema";

pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const SNIPPET: &str = "Snippet";
pub const VISIBILITY: &str = "visibility";
pub const OPEN: &str = "open";
pub const STYLE_URL: &str = "styleUrl";
pub const STYLE: &str = "Style";
pub const STYLE_MAP: &str = "StyleMap";
pub const PAIR: &str = "Pair";
pub const KEY: &str = "key";
pub const NORMAL: &str = "normal";
pub const HIGHLIGHT: &str = "highlight";
pub const REGION: &str = "Region";
pub const LOOK_AT: &str = "LookAt";
pub const CAMERA: &str = "Camera";
pub const TIME_SPAN: &str = "TimeSpan";
pub const TIME_STAMP: &str = "TimeStamp";
pub const BEGIN: &str = "begin";
pub const END: &str = "end";
pub const WHEN: &str = "when";
pub const EXTENDED_DATA: &str = "ExtendedData";
pub const METADATA: &str = "Metadata";
pub const DATA: &str = "Data";
pub const VALUE: &str = "value";
pub const SCHEMA_DATA: &str = "SchemaData";
pub const SIMPLE_DATA: &str = "SimpleData";
pub const SIMPLE_FIELD: &str = "SimpleField";
pub const DISPLAY_NAME: &str = "displayName";
pub const SCHEMA_URL: &str = "schemaUrl";
pub const PARENT: &str = "parent";

pub const ICON_STYLE: &str = "IconStyle";
pub const LINE_STYLE: &str = "LineStyle";
pub const POLY_STYLE: &str = "PolyStyle";
pub const LABEL_STYLE: &str = "LabelStyle";
pub const BALLOON_STYLE: &str = "BalloonStyle";
pub const COLOR: &str = "color";
pub const BG_COLOR: &str = "bgColor";
pub const TEXT_COLOR: &str = "textColor";
pub const TEXT: &str = "text";
pub const DISPLAY_MODE: &str = "displayMode";
pub const SCALE: &str = "scale";
pub const HEADING: &str = "heading";
pub const WIDTH: &str = "width";
pub const FILL: &str = "fill";
pub const OUTLINE: &str = "outline";
pub const ICON: &str = "Icon";
pub const HREF: &str = "href";

pub const POINT: &str = "Point";
pub const LINE_STRING: &str = "LineString";
pub const LINEAR_RING: &str = "LinearRing";
pub const POLYGON: &str = "Polygon";
pub const MULTI_GEOMETRY: &str = "MultiGeometry";
pub const MODEL: &str = "Model";
pub const LOCATION: &str = "Location";
pub const COORDINATES: &str = "coordinates";
pub const OUTER_BOUNDARY_IS: &str = "outerBoundaryIs";
pub const INNER_BOUNDARY_IS: &str = "innerBoundaryIs";
pub const ALTITUDE_MODE: &str = "altitudeMode";
pub const EXTRUDE: &str = "extrude";
pub const TESSELLATE: &str = "tessellate";
pub const LONGITUDE: &str = "longitude";
pub const LATITUDE: &str = "latitude";
pub const ALTITUDE: &str = "altitude";

pub const LINK: &str = "Link";
pub const URL: &str = "Url";
pub const REFRESH_VISIBILITY: &str = "refreshVisibility";
pub const FLY_TO_VIEW: &str = "flyToView";
pub const HTTP_QUERY: &str = "httpQuery";
pub const VIEW_FORMAT: &str = "viewFormat";

pub const LAT_LON_BOX: &str = "LatLonBox";
pub const NORTH: &str = "north";
pub const SOUTH: &str = "south";
pub const EAST: &str = "east";
pub const WEST: &str = "west";
pub const ROTATION: &str = "rotation";
pub const DRAW_ORDER: &str = "drawOrder";

pub const ID: &str = "id";

/// True for element names that open a container.
pub fn is_container(name: &str) -> bool {
    name == DOCUMENT || name == FOLDER
}

/// True for element names that open a feature.
pub fn is_feature(name: &str) -> bool {
    name == PLACEMARK || name == NETWORK_LINK || name == GROUND_OVERLAY
}

/// True for element names that open a geometry.
pub fn is_geometry(name: &str) -> bool {
    matches!(
        name,
        POINT | LINE_STRING | LINEAR_RING | POLYGON | MULTI_GEOMETRY | MODEL
    )
}
