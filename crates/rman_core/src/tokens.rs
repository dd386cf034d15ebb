//! Standard token names of the interface.
//!
//! Plain string constants; intern them with [`Token::new`](crate::Token::new)
//! where a token is needed.

// Geometry
pub const P: &str = "P";
pub const PZ: &str = "Pz";
pub const PW: &str = "Pw";
pub const N: &str = "N";
pub const NP: &str = "Np";
pub const CS: &str = "Cs";
pub const OS: &str = "Os";
pub const S: &str = "s";
pub const T: &str = "t";
pub const ST: &str = "st";
pub const WIDTH: &str = "width";
pub const CONSTANTWIDTH: &str = "constantwidth";

// Shader parameters
pub const KA: &str = "Ka";
pub const KD: &str = "Kd";
pub const KS: &str = "Ks";
pub const KR: &str = "Kr";
pub const ROUGHNESS: &str = "roughness";
pub const SPECULARCOLOR: &str = "specularcolor";
pub const TEXTURENAME: &str = "texturename";
pub const INTENSITY: &str = "intensity";
pub const LIGHTCOLOR: &str = "lightcolor";
pub const FROM: &str = "from";
pub const TO: &str = "to";
pub const CONEANGLE: &str = "coneangle";
pub const CONEDELTAANGLE: &str = "conedeltaangle";
pub const BEAMDISTRIBUTION: &str = "beamdistribution";
pub const AMPLITUDE: &str = "amplitude";
pub const BACKGROUND: &str = "background";
pub const DISTANCE: &str = "distance";
pub const MINDISTANCE: &str = "mindistance";
pub const MAXDISTANCE: &str = "maxdistance";
pub const FOV: &str = "fov";
pub const ORIGIN: &str = "origin";
pub const NAME: &str = "name";

// Enumerated values
pub const PERSPECTIVE: &str = "perspective";
pub const ORTHOGRAPHIC: &str = "orthographic";
pub const HIDDEN: &str = "hidden";
pub const PAINT: &str = "paint";
pub const CONSTANT: &str = "constant";
pub const SMOOTH: &str = "smooth";
pub const FLATNESS: &str = "flatness";
pub const INSIDE: &str = "inside";
pub const OUTSIDE: &str = "outside";
pub const LH: &str = "lh";
pub const RH: &str = "rh";
pub const BILINEAR: &str = "bilinear";
pub const BICUBIC: &str = "bicubic";
pub const LINEAR: &str = "linear";
pub const CUBIC: &str = "cubic";
pub const PRIMITIVE: &str = "primitive";
pub const INTERSECTION: &str = "intersection";
pub const UNION: &str = "union";
pub const DIFFERENCE: &str = "difference";
pub const PERIODIC: &str = "periodic";
pub const NONPERIODIC: &str = "nonperiodic";
pub const CLAMP: &str = "clamp";
pub const BLACK: &str = "black";
pub const IGNORE: &str = "ignore";
pub const PRINT: &str = "print";
pub const ABORT: &str = "abort";
pub const HANDLER: &str = "handler";
pub const FRAMEBUFFER: &str = "framebuffer";
pub const FILE: &str = "file";
pub const RGB: &str = "rgb";
pub const RGBA: &str = "rgba";
pub const RGBZ: &str = "rgbz";
pub const RGBAZ: &str = "rgbaz";
pub const A: &str = "a";
pub const Z: &str = "z";
pub const AZ: &str = "az";
pub const CATMULL_CLARK: &str = "catmull-clark";
pub const HOLE: &str = "hole";
pub const CREASE: &str = "crease";
pub const CORNER: &str = "corner";
pub const INTERPOLATEBOUNDARY: &str = "interpolateboundary";
pub const COMMENT: &str = "comment";
pub const STRUCTURE: &str = "structure";
pub const VERBATIM: &str = "verbatim";
pub const WORLD: &str = "world";
pub const CAMERA: &str = "camera";
pub const SCREEN: &str = "screen";
pub const RASTER: &str = "raster";
pub const OBJECT: &str = "object";
pub const SHADER: &str = "shader";
pub const NDC: &str = "NDC";

// Basis names
pub const BEZIER: &str = "bezier";
pub const BSPLINE: &str = "b-spline";
pub const CATMULLROM: &str = "catmull-rom";
pub const HERMITE: &str = "hermite";
pub const POWER: &str = "power";

// Built-in procedurals
pub const DELAYED_READ_ARCHIVE: &str = "DelayedReadArchive";
pub const RUN_PROGRAM: &str = "RunProgram";
pub const DYNAMIC_LOAD: &str = "DynamicLoad";

// Filters
pub const BOX_FILTER: &str = "box";
pub const TRIANGLE_FILTER: &str = "triangle";
pub const GAUSSIAN_FILTER: &str = "gaussian";
pub const SINC_FILTER: &str = "sinc";
pub const CATMULLROM_FILTER: &str = "catmull-rom";

/// Every standard name above, used to warm up the interner.
pub const STANDARD_TOKENS: &[&str] = &[
    P, PZ, PW, N, NP, CS, OS, S, T, ST, WIDTH, CONSTANTWIDTH, KA, KD, KS, KR, ROUGHNESS,
    SPECULARCOLOR, TEXTURENAME, INTENSITY, LIGHTCOLOR, FROM, TO, CONEANGLE, CONEDELTAANGLE,
    BEAMDISTRIBUTION, AMPLITUDE, BACKGROUND, DISTANCE, MINDISTANCE, MAXDISTANCE, FOV, ORIGIN,
    NAME, PERSPECTIVE, ORTHOGRAPHIC, HIDDEN, PAINT, CONSTANT, SMOOTH, FLATNESS, INSIDE, OUTSIDE,
    LH, RH, BILINEAR, BICUBIC, LINEAR, CUBIC, PRIMITIVE, INTERSECTION, UNION, DIFFERENCE,
    PERIODIC, NONPERIODIC, CLAMP, BLACK, IGNORE, PRINT, ABORT, HANDLER, FRAMEBUFFER, FILE, RGB,
    RGBA, RGBZ, RGBAZ, A, Z, AZ, CATMULL_CLARK, HOLE, CREASE, CORNER, INTERPOLATEBOUNDARY,
    COMMENT, STRUCTURE, VERBATIM, WORLD, CAMERA, SCREEN, RASTER, OBJECT, SHADER, NDC, BEZIER,
    BSPLINE, CATMULLROM, HERMITE, POWER, DELAYED_READ_ARCHIVE, RUN_PROGRAM, DYNAMIC_LOAD,
    BOX_FILTER, TRIANGLE_FILTER, GAUSSIAN_FILTER, SINC_FILTER,
];
