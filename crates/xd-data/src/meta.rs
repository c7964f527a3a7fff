//! Metadata names.

pub const NAME: &str = "$name";
pub const VALUE: &str = "$value";
pub const BASE: &str = "$base";
pub const TYPE: &str = "$type";
pub const EXTENDS: &str = "$extends";
pub const OVERLAYS: &str = "$overlays";
pub const MEMBER_TYPE: &str = "$memberType";
pub const MEMBER_TYPE_DEFINITION: &str = "$memberTypeDefinition";
pub const WRITABLE: &str = "$writable";
pub const OPTIONAL: &str = "$optional";
pub const UNITS: &str = "$units";
pub const UNITS_TEXT: &str = "$unitsText";
pub const MINIMUM: &str = "$minimum";
pub const MAXIMUM: &str = "$maximum";
pub const RESOLUTION: &str = "$resolution";
pub const MINIMUM_LENGTH: &str = "$minimumLength";
pub const MAXIMUM_LENGTH: &str = "$maximumLength";
pub const MINIMUM_SIZE: &str = "$minimumSize";
pub const MAXIMUM_SIZE: &str = "$maximumSize";
pub const MAXIMUM_SIZE_FOR_WRITING: &str = "$org.ampii.maximumSizeForWriting";
pub const MINIMUM_SIZE_FOR_WRITING: &str = "$org.ampii.minimumSizeForWriting";
pub const MINIMUM_FOR_WRITING: &str = "$minimumForWriting";
pub const MAXIMUM_FOR_WRITING: &str = "$maximumForWriting";
pub const MINIMUM_LENGTH_FOR_WRITING: &str = "$minimumLengthForWriting";
pub const MAXIMUM_LENGTH_FOR_WRITING: &str = "$maximumLengthForWriting";
pub const MINIMUM_ENCODED_LENGTH: &str = "$minimumEncodedLength";
pub const MAXIMUM_ENCODED_LENGTH: &str = "$maximumEncodedLength";
pub const MINIMUM_ENCODED_LENGTH_FOR_WRITING: &str = "$minimumEncodedLengthForWriting";
pub const MAXIMUM_ENCODED_LENGTH_FOR_WRITING: &str = "$maximumEncodedLengthForWriting";
pub const VARIABILITY: &str = "$variability";
pub const VOLATILITY: &str = "$volatility";
pub const WRITE_EFFECTIVE: &str = "$writeEffective";
pub const ALLOWED_TYPES: &str = "$allowedTypes";
pub const ALLOWED_CHOICES: &str = "$allowedChoices";
pub const DISPLAY_NAME: &str = "$displayName";
pub const DISPLAY_NAME_FOR_WRITING: &str = "$displayNameForWriting";
pub const DISPLAY_ORDER: &str = "$displayOrder";
pub const DESCRIPTION: &str = "$description";
pub const COMMENT: &str = "$comment";
pub const LENGTH: &str = "$length";
pub const ERROR: &str = "$error";
pub const ERROR_TEXT: &str = "$errorText";
pub const ABSENT: &str = "$absent";
pub const CONTEXT_TAG: &str = "$contextTag";
pub const PROPERTY_IDENTIFIER: &str = "$propertyIdentifier";
pub const COMMANDABLE: &str = "$commandable";
pub const BIT: &str = "$bit";
pub const READABLE: &str = "$readable";
pub const ASSOCIATED_WITH: &str = "$associatedWith";
pub const REQUIRED_WITH: &str = "$requiredWith";
pub const REQUIRED_WITHOUT: &str = "$requiredWithout";
pub const NOT_PRESENT_WITH: &str = "$notPresentWith";
pub const WRITABLE_WHEN: &str = "$writableWhen";
pub const WRITABLE_WHEN_TEXT: &str = "$writableWhenText";
pub const REQUIRED_WHEN: &str = "$requiredWhen";
pub const REQUIRED_WHEN_TEXT: &str = "$requiredWhenText";
pub const TARGET: &str = "$target";
pub const TARGET_TYPE: &str = "$targetType";
pub const HREF: &str = "$href";
pub const DOCUMENTATION: &str = "$documentation";
pub const PRIORITY_ARRAY: &str = "$priorityArray";
pub const RELINQUISH_DEFAULT: &str = "$relinquishDefault";
pub const HAS_HISTORY: &str = "$hasHistory";
pub const HISTORY: &str = "$history";
pub const UNSPECIFIED_VALUE: &str = "$unspecifiedValue";
pub const NAMED_VALUES: &str = "$namedValues";
pub const NAMED_BITS: &str = "$namedBits";
pub const CHOICES: &str = "$choices";
pub const LINKS: &str = "$links";
pub const TAGS: &str = "$tags";
pub const VALUE_TAGS: &str = "$valueTags";
pub const NOT_FOR_READING: &str = "$notForReading";
pub const NOT_FOR_WRITING: &str = "$notForWriting";
pub const PUBLISHED: &str = "$published";
pub const IS_MULTILINE: &str = "$isMultiline";
pub const TRUNCATED: &str = "$truncated";
pub const PARTIAL: &str = "$partial";
pub const IN_ALARM: &str = "$inAlarm";
pub const OVERRIDDEN: &str = "$overridden";
pub const FAULT: &str = "$fault";
pub const OUT_OF_SERVICE: &str = "$outOfService";
pub const NODE_TYPE: &str = "$nodeType";
pub const NODE_SUBTYPE: &str = "$nodeSubtype";
pub const COUNT: &str = "$count";
pub const MEDIA_TYPE: &str = "$mediaType";
pub const AUTH_READ: &str = "$authRead";
pub const AUTH_WRITE: &str = "$authWrite";
pub const AUTH_VISIBLE: &str = "$authVisible";
pub const CHILDREN: &str = "$children";
pub const DESCENDANTS: &str = "$descendants";
pub const ETAG: &str = "$etag";
pub const NEXT: &str = "$next";
pub const SELF: &str = "$self";
pub const VIA: &str = "$via";
pub const PHYSICAL: &str = "$physical";
pub const RELATED: &str = "$related";
pub const ALTERNATE: &str = "$alternate";
pub const UPDATED: &str = "$updated";
pub const AUTHOR: &str = "$author";
pub const EDIT: &str = "$edit";
pub const FAILURES: &str = "$failures";
pub const SUBSCRIPTION: &str = "$subscription";
pub const ID: &str = "$id";
pub const SOURCE_ID: &str = "$sourceId";
pub const ADD_REV: &str = "$addRev";
pub const REM_REV: &str = "$remRev";
pub const MOD_REV: &str = "$modRev";
pub const DATA_REV: &str = "$dataRev";
pub const REVISIONS: &str = "$revisions";
pub const OBJECT_TYPE: &str = "$objectType";
pub const REPRESENTS: &str = "$represents";
pub const VIA_EXTERNAL: &str = "$viaExternal";
pub const VIA_MAP: &str = "$viaMap";
pub const REL: &str = "$rel";

// server-private
pub const BINDING: &str = "$..binding";
pub const HISTORY_LOCATION: &str = "$..historyLocation";
pub const MATCH_ANY: &str = "$..matchAny";

/// Name of the definitions area whose contents are always definitions.
pub const UI_DEFINITIONS: &str = "$org.ampii.ui.definitions";
