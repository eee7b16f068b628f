use super::OperationSpec as Op;
use super::custom;

const TITLE: &[&str] = &["Title"];
const NAME: &[&str] = &["Name"];
const INTERNAL_NAME: &[&str] = &["InternalName"];
const STATIC_NAME: &[&str] = &["StaticName"];
const FIELD_NAMES: &[&str] = &["Title", "InternalName", "StaticName"];
const ACTION_NAMES: &[&str] = &["Name", "Title"];

/// Keys sharing another key's operations.
pub(super) const ALIASES: &[(&str, &str)] = &[("siteusers", "users")];

pub(super) const ENTRIES: &[(&str, &[Op])] = &[
    // Metadata types
    (
        "SP.ContentType",
        &[
            Op::post("deleteObject"),
            Op::post_body_no_args("addFieldLink")
                .at("fieldlinks")
                .stamped("SP.FieldLink"),
            Op::filter("getFieldByInternalName", "fields", INTERNAL_NAME),
            Op::filter("getFieldByStaticName", "fields", STATIC_NAME),
            Op::filter("getFieldByTitle", "fields", TITLE),
            Op::filter("getFieldLinkByName", "fieldlinks", NAME),
            Op::update("SP.ContentType"),
        ],
    ),
    (
        "SP.Field",
        &[
            Op::post("deleteObject"),
            Op::post("setShowInDisplayForm"),
            Op::post("setShowInEditForm"),
            Op::post("setShowInNewForm"),
            Op::update("SP.Field"),
        ],
    ),
    (
        "SP.File",
        &[
            Op::get("getLimitedWebPartManager"),
            Op::get_buffer("openBinaryStream"),
            Op::post("approve"),
            Op::post("cancelUpload"),
            Op::post("checkIn"),
            Op::post("checkOut"),
            Op::post("copyTo"),
            Op::post("deleteObject"),
            Op::post("deny"),
            Op::post("moveTo"),
            Op::post("publish"),
            Op::post("recycle"),
            Op::post("undoCheckOut"),
            Op::post("unpublish"),
            Op::post_body("continueUpload"),
            Op::post_body("finishUpload"),
            Op::post_body("saveBinaryStream"),
            Op::post_body("startUpload"),
            Op::update("SP.File"),
        ],
    ),
    ("SP.FileVersion", &[Op::post("deleteObject")]),
    (
        "SP.Folder",
        &[
            Op::post("deleteObject"),
            Op::post("recycle"),
            Op::post("uniqueContentTypeOrder"),
            Op::post_body("addFile").at("files/add"),
            Op::post("addSubFolder").at("folders/add"),
            Op::filter("getFile", "files", NAME),
            Op::filter("getSubFolder", "folders", NAME),
            Op::update("SP.Folder"),
        ],
    ),
    (
        "SP.Group",
        &[Op::custom("containsUser", custom::contains_user).at("users")],
    ),
    (
        "SP.List",
        &[
            Op::get("getRelatedFields"),
            Op::get("getView"),
            Op::get_alias("getUserEffectivePermissions"),
            Op::post("breakRoleInheritance"),
            Op::post("deleteObject"),
            Op::post("recycle"),
            Op::post("renderListData"),
            Op::post("renderListFormData"),
            Op::post("reserveListItemId"),
            Op::post("resetRoleInheritance"),
            Op::post_body_no_args("getChanges"),
            Op::post_body_no_args("getItems"),
            Op::post_body_no_args("getListItemChangesSinceToken"),
            Op::post_body_no_args("addContentType")
                .at("contenttypes")
                .stamped("SP.ContentType"),
            Op::post("addExistingContentType").at("contenttypes/addAvailableContentType"),
            Op::post_body_no_args("addField")
                .at("fields/add")
                .stamped("SP.Field"),
            Op::custom("addFieldAsXml", custom::add_field_as_xml).at("fields/createFieldAsXml"),
            Op::post_body_no_args("addItem")
                .at("items")
                .stamped("SP.ListItem"),
            Op::post("addSiteGroup").at("roleassignments/addroleassignment"),
            Op::custom("addSubFolder", custom::add_sub_folder_to_root_folder),
            Op::post_body_no_args("addView")
                .at("views")
                .stamped("SP.View"),
            Op::filter("getContentType", "contenttypes", NAME),
            Op::get("getContentTypeById").at("contenttypes/getById"),
            Op::custom("getDefaultDisplayFormUrl", custom::default_form_url)
                .at("forms?$filter=FormType eq 4"),
            Op::custom("getDefaultEditFormUrl", custom::default_form_url)
                .at("forms?$filter=FormType eq 6"),
            Op::custom("getDefaultNewFormUrl", custom::default_form_url)
                .at("forms?$filter=FormType eq 8"),
            Op::custom("getDefaultViewUrl", custom::default_view_url),
            Op::filter("getField", "fields", FIELD_NAMES),
            Op::get("getFieldById").at("fields/getById"),
            Op::filter("getFieldByInternalName", "fields", INTERNAL_NAME),
            Op::filter("getFieldByStaticName", "fields", STATIC_NAME),
            Op::filter("getFieldByTitle", "fields", TITLE),
            Op::key("getItemById", "items"),
            Op::filter("getItemByTitle", "items", TITLE),
            Op::custom("getItemsByFilter", custom::items_by_filter).at("items"),
            Op::navigate("getSchemaXml", "schemaxml"),
            Op::filter("getSubFolder", "rootfolder/folders", NAME),
            Op::get("getViewById").at("views/getById"),
            Op::filter("getViewByTitle", "views", TITLE),
            Op::custom("hasAccess", custom::has_access_for_user),
            Op::update("SP.List"),
        ],
    ),
    (
        "SP.ListItem",
        &[
            Op::get_alias("getUserEffectivePermissions"),
            Op::post("breakRoleInheritance"),
            Op::post("deleteObject"),
            Op::post("recycle"),
            Op::post("resetRoleInheritance"),
            Op::post_body_no_args("validateUpdateListItem"),
            Op::update("SP.ListItem").stamped_with_own_type(),
        ],
    ),
    ("SP.RoleAssignment", &[Op::post("deleteObject")]),
    ("SP.RoleDefinition", &[Op::post("deleteObject")]),
    (
        "Microsoft.Office.Server.Search.REST.SearchService",
        &[
            Op::custom("query", custom::search_query),
            Op::custom("querySuggestion", custom::query_suggestion).at("suggest"),
        ],
    ),
    (
        "SP.Site",
        &[
            Op::post("createPreviewSPSite"),
            Op::post("extendUpgradeReminderDate"),
            Op::post("getCatalog"),
            Op::post("getCustomListTemplates"),
            Op::post("getWebTemplates"),
            Op::post("invalidate"),
            Op::post("needsUpgradeByType"),
            Op::post("openWeb"),
            Op::post("openWebById"),
            Op::post("runHealthCheck"),
            Op::post("runUpgradeSiteSession"),
            Op::post("updateClientObjectModelUseRemoteAPIsPermissionSetting"),
            Op::post_body_no_args("getChanges"),
            Op::post_body_no_args("addCustomAction")
                .at("usercustomactions")
                .stamped("SP.UserCustomAction"),
            Op::filter("getCustomAction", "usercustomactions", ACTION_NAMES),
            Op::custom("getRootWeb", custom::root_web),
            Op::custom("hasAccess", custom::has_access),
            Op::custom("sendEmail", custom::send_email),
            Op::update("SP.Site"),
        ],
    ),
    (
        "SP.Social.SocialRestActor",
        &[
            Op::custom("createPost", custom::create_post).at("feed/post"),
            Op::navigate("getFeed", "feed"),
        ],
    ),
    (
        "SP.Social.SocialRestFeedManager",
        &[
            Op::custom("createPost", custom::create_post).at("my/feed/post"),
            Op::custom("deletePost", custom::post_by_id).at("post/delete"),
            Op::navigate("getMyFeed", "my/feed"),
            Op::navigate("getMyInfo", "my"),
            Op::navigate("getMyLikes", "my/likes"),
            Op::navigate("getMyMentionFeed", "my/mentionfeed"),
            Op::navigate("getMyNews", "my/news"),
            Op::navigate("getMyTimeLineFeed", "my/timelinefeed"),
            Op::navigate("getMyUnreadMentionCount", "my/unreadmentioncount"),
            Op::custom("getPost", custom::post_by_id).at("post"),
            Op::custom("getPostLikers", custom::post_by_id).at("post/likers"),
            Op::custom("getUser", custom::social_actor).at("actor"),
            Op::custom("likePost", custom::post_by_id).at("post/like"),
            Op::custom("lockPost", custom::post_by_id).at("post/lock"),
            Op::custom("replyToPost", custom::reply_to_post).at("post/reply"),
            Op::custom("unlikePost", custom::post_by_id).at("post/unlike"),
            Op::custom("unlockPost", custom::post_by_id).at("post/unlock"),
        ],
    ),
    (
        "SP.Social.SocialRestThread",
        &[
            Op::custom("delete", custom::thread_action),
            Op::custom("like", custom::thread_action),
            Op::custom("lock", custom::thread_action),
            Op::custom("reply", custom::thread_reply),
            Op::custom("unlike", custom::thread_action),
            Op::custom("unlock", custom::thread_action),
        ],
    ),
    ("SP.UserCustomAction", &[Op::post("deleteObject")]),
    (
        "SP.UserProfiles.PeopleManager",
        &[
            Op::get("amlFollowedBy"),
            Op::get("amlFollowing"),
            Op::get("getFollowedTags"),
            Op::get("getFollowersFor"),
            Op::get("getMyFollowers"),
            Op::get("getMyProperties"),
            Op::get("getMySuggestions"),
            Op::get("getPeopleFollowedBy"),
            Op::get("getPeopleFollowedByMe"),
            Op::get("getPropertiesFor"),
            Op::get("getUserProfilePropertyFor"),
            Op::get_appended("getTrendingTags"),
            Op::get_appended("isFollowing"),
            Op::post("follow"),
            Op::post("followTag"),
            Op::post("hideSuggestion"),
            Op::post("stopFollowing"),
            Op::post("stopFollowingTag"),
            Op::post_body("setMyProfilePicture"),
        ],
    ),
    (
        "SP.UserProfiles.ProfileLoader",
        &[
            Op::post("getOwnerUserProfile"),
            Op::post("getUserProfile"),
            Op::post_body("createPersonalSiteEnqueueBulk"),
        ],
    ),
    (
        "SP.UserProfiles.UserProfile",
        &[
            Op::post("createPersonalSiteEnque"),
            Op::post("shareAllSocialData"),
            Op::custom("getOneDriveUrl", custom::one_drive_url),
        ],
    ),
    (
        "SP.View",
        &[
            Op::get("renderAsHtml"),
            Op::post("deleteObject"),
            Op::update("SP.View"),
        ],
    ),
    (
        "SP.ViewFieldCollection",
        &[
            Op::post("addViewField"),
            Op::post("moveViewFieldTo"),
            Op::post("removeAllViewFields"),
            Op::post("removeViewField"),
        ],
    ),
    (
        "SP.Web",
        &[
            Op::get("doesPushNotificationSubscriberExist"),
            Op::get("getAppInstanceById"),
            Op::get("getAppInstancesByProductId"),
            Op::get("getAvailableWebTemplates"),
            Op::get("getCatalog"),
            Op::get("getContextWebInformation"),
            Op::get("getCustomListTemplates"),
            Op::get("getDocumentLibraries"),
            Op::get("getFileByServerRelativeUrl"),
            Op::get("getFolderByServerRelativeUrl"),
            Op::get("getList"),
            Op::get("getPushNotificationSubscriber"),
            Op::get("getPushNotificationSubscribersByArgs"),
            Op::get("getPushNotificationSubscribersByUser"),
            Op::get("getSubwebsFilteredForCurrentUser"),
            Op::get("getWebUrlFromPageUrl"),
            Op::get("mapsToIcon"),
            Op::get_alias("doesUserHavePermissions"),
            Op::get_alias("getUserEffectivePermissions"),
            Op::post("applyTheme"),
            Op::post("applyWebTemplate"),
            Op::post("breakRoleInheritance"),
            Op::post("deleteObject"),
            Op::post("getAppBdcCatalog"),
            Op::post("getAppBdcCatalogForAppInstance"),
            Op::post("getEntity"),
            Op::post("registerPushNotificationSubscriber"),
            Op::post("resetRoleInheritance"),
            Op::post("unregisterPushNotificationSubscriber"),
            Op::post_alias("ensureUser"),
            Op::post_body_no_args("executeRemoteLOB"),
            Op::post_body_no_args("getChanges"),
            Op::post_body_no_args("loadAndInstallApp"),
            Op::post_body_no_args("loadAndInstallAppInSpecifiedLocale"),
            Op::post_body_no_args("loadApp"),
            Op::post_body_no_args("processExternalNotification"),
            Op::post_body_no_args("addContentType")
                .at("contenttypes")
                .stamped("SP.ContentType"),
            Op::post_body_no_args("addCustomAction")
                .at("usercustomactions")
                .stamped("SP.UserCustomAction"),
            Op::post("addExistingContentType").at("contenttypes/addAvailableContentType"),
            Op::post_body_no_args("addField")
                .at("fields/add")
                .stamped("SP.Field"),
            Op::custom("addFieldAsXml", custom::add_field_as_xml).at("fields/createFieldAsXml"),
            Op::post_body("addFile").at("rootfolder/files/add"),
            Op::post_body_no_args("addList")
                .at("lists")
                .stamped("SP.List"),
            Op::post_body_no_args("addPermission")
                .at("roledefinitions")
                .stamped("SP.RoleDefinition"),
            Op::custom("addSiteGroup", custom::add_site_group).at("sitegroups"),
            Op::post("addSubFolder").at("rootfolder/folders/add"),
            Op::custom("addWeb", custom::add_web),
            Op::filter("getContentType", "contenttypes", NAME),
            Op::get("getContentTypeById").at("contenttypes/getById"),
            Op::filter("getCustomAction", "usercustomactions", ACTION_NAMES),
            Op::filter("getField", "fields", FIELD_NAMES),
            Op::get("getFieldById").at("fields/getById"),
            Op::filter("getFieldByInternalName", "fields", INTERNAL_NAME),
            Op::filter("getFieldByStaticName", "fields", STATIC_NAME),
            Op::filter("getFieldByTitle", "fields", TITLE),
            Op::filter("getFile", "rootfolder/files", NAME),
            Op::get("getListById").at("lists/getById"),
            Op::filter("getListByTitle", "lists", TITLE),
            Op::get("getSiteGroupById").at("sitegroups/getById"),
            Op::get("getSiteGroupByName").at("sitegroups/getByName"),
            Op::filter("getSubFolder", "rootfolder/folders", NAME),
            Op::custom("getUserById", custom::user_by_id).at("siteusers"),
            Op::get_alias("getUserByLogin").at("siteusers/getByLoginName"),
            Op::custom("hasAccess", custom::has_access),
            Op::custom("sendEmail", custom::send_email),
            Op::update("SP.Web"),
        ],
    ),
    (
        "SP.WebParts.LimitedWebPartManager",
        &[Op::navigate("get_WebParts", "WebParts?$expand=WebPart")],
    ),
    // Endpoint leaves
    (
        "contenttypes",
        &[
            Op::get("getById"),
            Op::post("addAvailableContentType"),
            Op::post_body_no_args("add"),
        ],
    ),
    (
        "fields",
        &[
            Op::get("getById"),
            Op::get("getByInternalNameOrTitle"),
            Op::post("addDependentLookup"),
            Op::post_body_no_args("addField"),
            Op::post_body_no_args("createFieldAsXml"),
        ],
    ),
    (
        "fieldlinks",
        &[Op::get("getById"), Op::post_body_no_args("add")],
    ),
    (
        "files",
        &[
            Op::get("getByTitle"),
            Op::get("getByUrl"),
            Op::post_body("add"),
            Op::post_body("addTemplateFile"),
        ],
    ),
    (
        "versions",
        &[
            Op::get("getById"),
            Op::post("deleteAll"),
            Op::post("deleteById"),
            Op::post("deleteByLabel"),
            Op::post("restoreByLabel"),
        ],
    ),
    ("folders", &[Op::get("getByUrl"), Op::post("add")]),
    (
        "sitegroups",
        &[
            Op::get("getById"),
            Op::get("getByName"),
            Op::post("removeById"),
            Op::post("removeByLoginName"),
        ],
    ),
    ("items", &[Op::get("getById")]),
    (
        "lists",
        &[
            Op::get("getById"),
            Op::post("ensureSiteAssetsLibrary"),
            Op::post("ensureSitePagesLibrary"),
        ],
    ),
    (
        "roleassignments",
        &[
            Op::get("getByPrincipalId"),
            Op::post("addRoleAssignment"),
            Op::post("removeRoleAssignment"),
        ],
    ),
    (
        "roledefinitions",
        &[Op::get("getById"), Op::get("getByName"), Op::get("getByType")],
    ),
    (
        "users",
        &[
            Op::get("getByEmail"),
            Op::get("getById"),
            Op::get_alias("getByLoginName"),
            Op::post("removeById"),
            Op::post_alias("removeByLoginName"),
        ],
    ),
    (
        "usercustomactions",
        &[Op::get("getById"), Op::post("clear")],
    ),
    ("views", &[Op::get("getById")]),
    (
        "webs",
        &[Op::custom("add", custom::add_web_information).at("add")],
    ),
];
