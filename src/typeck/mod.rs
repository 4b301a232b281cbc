//! Type checking: phase 6.
//!
//! Assigns a type value to every expression and enforces assignability on
//! assignments, initializers, returns and arguments, the legality of every
//! operator, cast rules, and static/instance/protected access. The phase
//! only reads the environment; name-chain classifications recorded by the
//! disambiguator are consumed here, with [`classify`] as the fallback for
//! chains that phase never visited.

pub mod values;

use crate::disambig::{NameTarget, classify};
use crate::env::GlobalEnv;
use crate::error::{SemanticError, SemanticResult};
use crate::syntax::SyntaxTree;
use crate::typeck::values::{Primitive, TypeValue, assignable, castable};
use crate::types::{Modifiers, NodeId, ScopeId, Span, TypeId, UnitId};
use tracing::debug;

const STRING: &str = "java.lang.String";

pub fn type_check(env: &GlobalEnv) -> SemanticResult<()> {
    for ty in env.type_ids() {
        let unit = env.type_decl(ty).unit;
        let checker = TypeChecker {
            env,
            unit,
            tree: &env.unit(unit).tree,
            source: &env.unit(unit).source,
        };
        checker.check_type(ty)?;
    }
    Ok(())
}

/// The static context of the expression being checked.
#[derive(Clone, Copy)]
struct Ctx {
    scope: ScopeId,
    in_static: bool,
    /// Position of the field declaration whose initializer is being checked;
    /// drives the forward-reference rule.
    init_span: Option<Span>,
}

/// The type of an expression, plus the marker distinguishing a type name in
/// expression position (the receiver of a static access) from a value.
#[derive(Debug, Clone)]
struct ExprType {
    value: TypeValue,
    is_type: bool,
}

impl ExprType {
    fn value(value: TypeValue) -> Self {
        Self {
            value,
            is_type: false,
        }
    }

    fn type_name(ty: TypeId) -> Self {
        Self {
            value: TypeValue::Decl(ty),
            is_type: true,
        }
    }

    /// The value this expression denotes; a bare type name is not one.
    fn into_value(self, env: &GlobalEnv) -> SemanticResult<TypeValue> {
        if self.is_type {
            return Err(SemanticError::new(format!(
                "Type name '{}' used as an expression",
                self.value.display_name(env)
            )));
        }
        Ok(self.value)
    }
}

struct TypeChecker<'a> {
    env: &'a GlobalEnv,
    unit: UnitId,
    tree: &'a SyntaxTree,
    source: &'a str,
}

impl TypeChecker<'_> {
    fn text(&self, node: NodeId) -> &str {
        self.tree.text(node, self.source)
    }

    fn err(&self, node: NodeId, message: impl Into<String>) -> SemanticError {
        SemanticError::at(message, self.tree.span(node))
    }

    fn check_type(&self, ty: TypeId) -> SemanticResult<()> {
        let decl = self.env.type_decl(ty);
        let Some(body_scope) = decl.body_scope else {
            return Ok(());
        };
        debug!(name = %decl.name, "type checking");

        let body = self.env.scope(body_scope).node;
        for member in self.tree.named_children(body) {
            match self.tree.kind(member) {
                "field_declaration" => self.check_field_initializer(ty, body_scope, member)?,
                "method_declaration" | "constructor_declaration" => {
                    if let Some(node) = self.tree.child_by_field(member, "body") {
                        if let Some(scope) = self.env.scope_at(self.unit, node) {
                            let ctx = Ctx {
                                scope,
                                in_static: self.env.scope(scope).is_static,
                                init_span: None,
                            };
                            self.check_stmt(ctx, node)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_field_initializer(
        &self,
        ty: TypeId,
        body_scope: ScopeId,
        node: NodeId,
    ) -> SemanticResult<()> {
        let declarator = self
            .tree
            .child_by_field(node, "declarator")
            .ok_or_else(|| self.err(node, "Field without a declarator"))?;
        let Some(value) = self.tree.child_by_field(declarator, "value") else {
            return Ok(());
        };

        let name = self
            .tree
            .child_by_field(declarator, "name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let field = self
            .env
            .type_decl(ty)
            .declared_field(name)
            .ok_or_else(|| self.err(node, format!("Field {name} is not declared")))?;
        let field_type = self
            .env
            .resolve_name(ty, &field.ty)
            .ok_or_else(|| self.err(node, format!("Type name '{}' could not be resolved", field.ty)))?;

        let ctx = Ctx {
            scope: body_scope,
            in_static: field.modifiers.is_static(),
            init_span: Some(field.span),
        };
        let rhs = self.resolve_expr(ctx, value)?.into_value(self.env)?;
        if !assignable(self.env, &rhs, &field_type) {
            return Err(self.err(
                node,
                format!(
                    "Cannot assign type {} to {}",
                    rhs.display_name(self.env),
                    field_type.display_name(self.env)
                ),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn check_stmt(&self, ctx: Ctx, node: NodeId) -> SemanticResult<()> {
        // Scope-introducing statements carry their own scope.
        let ctx = match self.env.scope_at(self.unit, node) {
            Some(scope) => Ctx { scope, ..ctx },
            None => ctx,
        };

        match self.tree.kind(node) {
            "block" | "constructor_body" => {
                for child in self.tree.named_children(node) {
                    self.check_stmt(ctx, child)?;
                }
            }
            "local_variable_declaration" => self.check_local(ctx, node)?,
            "expression_statement" => {
                if let Some(expr) = self.tree.named_children(node).next() {
                    self.resolve_expr(ctx, expr)?;
                }
            }
            "return_statement" => self.check_return(ctx, node)?,
            "if_statement" | "while_statement" => {
                if let Some(cond) = self.tree.child_by_field(node, "condition") {
                    self.check_condition(ctx, cond)?;
                }
                for field in ["consequence", "alternative", "body"] {
                    if let Some(stmt) = self.tree.child_by_field(node, field) {
                        self.check_stmt(ctx, stmt)?;
                    }
                }
            }
            "for_statement" => {
                if let Some(init) = self.tree.child_by_field(node, "init") {
                    if self.tree.kind(init) == "local_variable_declaration" {
                        self.check_stmt(ctx, init)?;
                    } else {
                        self.resolve_expr(ctx, init)?;
                    }
                }
                // The condition is optional in a for statement.
                if let Some(cond) = self.tree.child_by_field(node, "condition") {
                    self.check_condition(ctx, cond)?;
                }
                if let Some(update) = self.tree.child_by_field(node, "update") {
                    self.resolve_expr(ctx, update)?;
                }
                if let Some(body) = self.tree.child_by_field(node, "body") {
                    self.check_stmt(ctx, body)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn check_condition(&self, ctx: Ctx, node: NodeId) -> SemanticResult<()> {
        let cond = self.resolve_expr(ctx, node)?.into_value(self.env)?;
        if !cond.is_boolean() {
            return Err(self.err(
                node,
                format!(
                    "If/While/For condition must have type boolean (found {})",
                    cond.display_name(self.env)
                ),
            ));
        }
        Ok(())
    }

    fn check_local(&self, ctx: Ctx, node: NodeId) -> SemanticResult<()> {
        let declarator = self
            .tree
            .child_by_field(node, "declarator")
            .ok_or_else(|| self.err(node, "Local variable without a declarator"))?;
        let name = self
            .tree
            .child_by_field(declarator, "name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let var = self
            .env
            .resolve_local(ctx.scope, name)
            .ok_or_else(|| self.err(node, format!("Local variable {name} is not declared")))?;

        let enclosing = self.env.enclosing_type(ctx.scope);
        let declared = self
            .env
            .resolve_name(enclosing, &var.ty)
            .ok_or_else(|| self.err(node, format!("Type name '{}' could not be resolved", var.ty)))?;

        let value = self
            .tree
            .child_by_field(declarator, "value")
            .ok_or_else(|| self.err(node, "Local variable must have an initializer"))?;
        let init = self.resolve_expr(ctx, value)?.into_value(self.env)?;

        if !assignable(self.env, &init, &declared) {
            return Err(self.err(
                node,
                format!(
                    "Cannot assign type {} to {}",
                    init.display_name(self.env),
                    declared.display_name(self.env)
                ),
            ));
        }
        Ok(())
    }

    fn check_return(&self, ctx: Ctx, node: NodeId) -> SemanticResult<()> {
        let Some(expr) = self.tree.named_children(node).next() else {
            return Ok(());
        };
        let returned = self.resolve_expr(ctx, expr)?.into_value(self.env)?;

        // Expression-bearing returns only occur in non-void methods; the
        // weeder rejected them in constructors and void methods.
        let Some(method) = self.env.enclosing_method(ctx.scope) else {
            return Ok(());
        };
        let expected = self
            .env
            .resolve_name(method.owner, &method.return_type)
            .ok_or_else(|| {
                self.err(
                    node,
                    format!("Type name '{}' could not be resolved", method.return_type),
                )
            })?;
        if !assignable(self.env, &returned, &expected) {
            return Err(self.err(
                node,
                format!(
                    "Cannot return type {} from method returning {}",
                    returned.display_name(self.env),
                    expected.display_name(self.env)
                ),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn resolve_expr(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let tree = self.tree;
        match tree.kind(node) {
            "decimal_integer_literal" => Ok(ExprType::value(TypeValue::Primitive(Primitive::Int))),
            "character_literal" => Ok(ExprType::value(TypeValue::Primitive(Primitive::Char))),
            "true" | "false" => Ok(ExprType::value(TypeValue::Primitive(Primitive::Boolean))),
            "null_literal" => Ok(ExprType::value(TypeValue::Null)),
            "string_literal" => {
                let string = self
                    .env
                    .lookup(STRING)
                    .ok_or_else(|| self.err(node, "java.lang.String is not declared"))?;
                Ok(ExprType::value(TypeValue::Decl(string)))
            }
            "this" => {
                if ctx.in_static {
                    return Err(self.err(node, "Keyword 'this' found in static context"));
                }
                Ok(ExprType::value(TypeValue::Decl(
                    self.env.enclosing_type(ctx.scope),
                )))
            }
            "parenthesized_expression" => {
                let inner = tree
                    .named_children(node)
                    .next()
                    .ok_or_else(|| self.err(node, "Empty parenthesized expression"))?;
                self.resolve_expr(ctx, inner)
            }
            "identifier" => self.resolve_chain(ctx, node),
            "field_access" => {
                if tree.flatten_name(node, self.source).is_some() {
                    self.resolve_chain(ctx, node)
                } else {
                    let object = tree
                        .child_by_field(node, "object")
                        .ok_or_else(|| self.err(node, "Field access without a receiver"))?;
                    let field = tree
                        .child_by_field(node, "field")
                        .map(|f| self.text(f).to_string())
                        .unwrap_or_default();
                    let receiver = self.resolve_expr(ctx, object)?;
                    self.access_member(ctx, node, receiver, &field)
                }
            }
            "method_invocation" => self.check_invocation(ctx, node),
            "object_creation_expression" => self.check_instance_creation(ctx, node),
            "array_creation_expression" => self.check_array_creation(ctx, node),
            "binary_expression" => self.check_binary(ctx, node),
            "instanceof_expression" => self.check_instanceof(ctx, node),
            "unary_expression" => self.check_unary(ctx, node),
            "cast_expression" => self.check_cast(ctx, node),
            "assignment_expression" => self.check_assignment(ctx, node),
            "array_access" => self.check_array_access(ctx, node),
            kind => Err(self.err(node, format!("Unsupported expression: {kind}"))),
        }
    }

    /// Type a dotted name chain from its disambiguated root.
    fn resolve_chain(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let parts = self
            .tree
            .flatten_name(node, self.source)
            .ok_or_else(|| self.err(node, "Malformed name chain"))?;

        let target = match self.env.annotations.get(&(self.unit, node)) {
            Some(target) => target.clone(),
            None => classify(self.env, ctx.scope, &parts, ctx.in_static)
                .map_err(|e| SemanticError::at(e.message, self.tree.span(node)))?,
        };

        let enclosing = self.env.enclosing_type(ctx.scope);

        // Forward reference: a field initializer may not read a non-static
        // field of the same type declared at a later (line, column) unless
        // the access is qualified by `this`.
        if let (NameTarget::Field, Some(init_span)) = (&target, ctx.init_span) {
            if let Some(field) = self.env.type_decl(enclosing).declared_field(&parts[0]) {
                if field.owner == enclosing
                    && !field.modifiers.is_static()
                    && field.span >= init_span
                {
                    return Err(self.err(
                        node,
                        "Initializer of non-static field cannot use a non-static field \
                         declared later without explicit 'this'",
                    ));
                }
            }
        }

        let (mut current, rest_from) = match &target {
            NameTarget::This => (
                ExprType::value(TypeValue::Decl(enclosing)),
                1,
            ),
            NameTarget::Local => {
                let var = self
                    .env
                    .resolve_local(ctx.scope, &parts[0])
                    .ok_or_else(|| self.err(node, format!("Name '{}' could not be resolved", parts[0])))?;
                let ty = self.env.resolve_name(enclosing, &var.ty).ok_or_else(|| {
                    self.err(node, format!("Type name '{}' could not be resolved", var.ty))
                })?;
                (ExprType::value(ty), 1)
            }
            NameTarget::Field => {
                let receiver = ExprType::value(TypeValue::Decl(enclosing));
                (self.access_member(ctx, node, receiver, &parts[0])?, 1)
            }
            NameTarget::Type { ty, parts: n } => (ExprType::type_name(*ty), *n),
        };

        for part in &parts[rest_from..] {
            current = self.access_member(ctx, node, current, part)?;
        }
        Ok(current)
    }

    /// Resolve a field access on a receiver, enforcing static/instance and
    /// protected access rules. Array types expose only `length`.
    fn access_member(
        &self,
        ctx: Ctx,
        node: NodeId,
        receiver: ExprType,
        name: &str,
    ) -> SemanticResult<ExprType> {
        let accessor = self.env.enclosing_type(ctx.scope);
        match &receiver.value {
            TypeValue::Array(_) => {
                if name == "length" {
                    // Synthetic public final int length.
                    return Ok(ExprType::value(TypeValue::Primitive(Primitive::Int)));
                }
                Err(self.err(
                    node,
                    format!(
                        "Field {name} could not be resolved on {}",
                        receiver.value.display_name(self.env)
                    ),
                ))
            }
            TypeValue::Decl(ty) => {
                let field = self.env.find_field(*ty, name).ok_or_else(|| {
                    self.err(
                        node,
                        format!(
                            "Field {name} could not be resolved on {}",
                            self.env.type_decl(*ty).name
                        ),
                    )
                })?;
                self.validate_member_access(
                    node,
                    name,
                    field.modifiers,
                    field.owner,
                    accessor,
                    receiver.is_type,
                    *ty,
                )?;
                let field_type = self.env.resolve_name(field.owner, &field.ty).ok_or_else(|| {
                    self.err(node, format!("Type name '{}' could not be resolved", field.ty))
                })?;
                Ok(ExprType::value(field_type))
            }
            _ => Err(self.err(
                node,
                format!(
                    "Cannot access field {name} on type {}",
                    receiver.value.display_name(self.env)
                ),
            )),
        }
    }

    /// Static members are accessible only through a type, instance members
    /// only through an instance. A protected member declared in package P by
    /// class C is accessible from A when A is in P, or A is a subclass of C
    /// and either the member is static or the receiver type is a subclass
    /// of A.
    #[allow(clippy::too_many_arguments)]
    fn validate_member_access(
        &self,
        node: NodeId,
        name: &str,
        modifiers: Modifiers,
        owner: TypeId,
        accessor: TypeId,
        static_access: bool,
        receiver: TypeId,
    ) -> SemanticResult<()> {
        if static_access && !modifiers.is_static() {
            return Err(self.err(
                node,
                format!("Cannot access non-static name {name} from static context"),
            ));
        }
        if !static_access && modifiers.is_static() {
            return Err(self.err(
                node,
                format!("Cannot access static name {name} from non-static context"),
            ));
        }

        if modifiers.is_protected() {
            let owner_decl = self.env.type_decl(owner);
            let accessor_decl = self.env.type_decl(accessor);
            let related = self.env.is_subclass_of(accessor, &owner_decl.name)
                && (modifiers.is_static()
                    || self.env.is_subclass_of(receiver, &accessor_decl.name));
            if !related && accessor_decl.package() != owner_decl.package() {
                return Err(self.err(
                    node,
                    format!("Cannot access protected name {name} from unrelated context"),
                ));
            }
        }
        Ok(())
    }

    fn check_invocation(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let tree = self.tree;
        let method_name = tree
            .child_by_field(node, "name")
            .map(|n| self.text(n).to_string())
            .ok_or_else(|| self.err(node, "Method invocation without a name"))?;

        let receiver = match tree.child_by_field(node, "object") {
            Some(object) => {
                if tree.flatten_name(object, self.source).is_some() {
                    self.resolve_chain(ctx, object)?
                } else {
                    self.resolve_expr(ctx, object)?
                }
            }
            None => {
                if ctx.in_static {
                    return Err(self.err(
                        node,
                        format!(
                            "No implicit this in static context (attempting to invoke {method_name})"
                        ),
                    ));
                }
                ExprType::value(TypeValue::Decl(self.env.enclosing_type(ctx.scope)))
            }
        };

        let arg_types = self.argument_types(ctx, node)?;

        let ty = match &receiver.value {
            TypeValue::Decl(ty) => *ty,
            other => {
                return Err(self.err(
                    node,
                    format!(
                        "Cannot call method {method_name} on simple type {}",
                        other.display_name(self.env)
                    ),
                ));
            }
        };

        let method = self.env.find_method(ty, &method_name, &arg_types).ok_or_else(|| {
            self.err(
                node,
                format!(
                    "Method {method_name}({}) could not be resolved on {}",
                    arg_types.join(","),
                    self.env.type_decl(ty).name
                ),
            )
        })?;

        let accessor = self.env.enclosing_type(ctx.scope);
        self.validate_member_access(
            node,
            &method_name,
            method.modifiers,
            method.owner,
            accessor,
            receiver.is_type,
            ty,
        )?;

        let return_type = self
            .env
            .resolve_name(method.owner, &method.return_type)
            .ok_or_else(|| {
                self.err(
                    node,
                    format!("Type name '{}' could not be resolved", method.return_type),
                )
            })?;
        Ok(ExprType::value(return_type))
    }

    fn argument_types(&self, ctx: Ctx, node: NodeId) -> SemanticResult<Vec<String>> {
        let Some(args) = self.tree.child_by_field(node, "arguments") else {
            return Ok(Vec::new());
        };
        self.tree
            .named_children(args)
            .map(|arg| {
                let value = self.resolve_expr(ctx, arg)?.into_value(self.env)?;
                Ok(value.display_name(self.env))
            })
            .collect()
    }

    /// `new T(args)`: `T` must resolve to a class with a constructor whose
    /// parameter list matches the argument types by simple name.
    fn check_instance_creation(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let enclosing = self.env.enclosing_type(ctx.scope);
        let type_node = self
            .tree
            .child_by_field(node, "type")
            .ok_or_else(|| self.err(node, "Instance creation without a type"))?;
        let type_name = self.text(type_node);

        let created = match self.env.resolve_name(enclosing, type_name) {
            Some(TypeValue::Decl(ty)) => ty,
            _ => {
                return Err(self.err(
                    node,
                    format!("Type name '{type_name}' could not be resolved"),
                ));
            }
        };

        let arg_types = self.argument_types(ctx, node)?;
        let arg_simple: Vec<&str> = arg_types
            .iter()
            .map(|t| crate::link::simple_name(t))
            .collect();

        let matched = self.env.type_decl(created).constructors.iter().any(|ctor| {
            ctor.param_types.len() == arg_simple.len()
                && ctor
                    .param_types
                    .iter()
                    .zip(&arg_simple)
                    .all(|(param, arg)| {
                        let resolved = self
                            .env
                            .resolve_name(created, param)
                            .map(|v| v.display_name(self.env))
                            .unwrap_or_else(|| param.clone());
                        crate::link::simple_name(&resolved) == *arg
                    })
        });
        if !matched {
            return Err(self.err(
                node,
                format!(
                    "No constructor of {} matches argument types ({})",
                    self.env.type_decl(created).name,
                    arg_types.join(",")
                ),
            ));
        }
        Ok(ExprType::value(TypeValue::Decl(created)))
    }

    fn check_array_creation(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let enclosing = self.env.enclosing_type(ctx.scope);
        let type_node = self
            .tree
            .child_by_field(node, "type")
            .ok_or_else(|| self.err(node, "Array creation without an element type"))?;
        let element = self
            .env
            .resolve_name(enclosing, self.text(type_node))
            .ok_or_else(|| {
                self.err(
                    node,
                    format!("Type name '{}' could not be resolved", self.text(type_node)),
                )
            })?;

        let dims = self.tree.find_all(node, "dimensions_expr");
        for dim in &dims {
            if let Some(size) = self.tree.named_children(*dim).next() {
                let size_type = self.resolve_expr(ctx, size)?.into_value(self.env)?;
                if !size_type.is_numeric() {
                    return Err(self.err(
                        node,
                        format!(
                            "Size expression of array creation must be a numeric type (found {})",
                            size_type.display_name(self.env)
                        ),
                    ));
                }
            }
        }
        Ok(ExprType::value(TypeValue::Array(Box::new(element))))
    }

    fn check_binary(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let left_node = self
            .tree
            .child_by_field(node, "left")
            .ok_or_else(|| self.err(node, "Binary expression without a left operand"))?;
        let right_node = self
            .tree
            .child_by_field(node, "right")
            .ok_or_else(|| self.err(node, "Binary expression without a right operand"))?;
        let op = self
            .tree
            .child_by_field(node, "operator")
            .map(|o| self.text(o))
            .unwrap_or_default();

        let left = self.resolve_expr(ctx, left_node)?.into_value(self.env)?;
        let right = self.resolve_expr(ctx, right_node)?.into_value(self.env)?;

        if left.is_void() || right.is_void() {
            return Err(self.err(node, format!("Operand cannot have type void in {op} expression")));
        }

        let bool_result = ExprType::value(TypeValue::Primitive(Primitive::Boolean));
        let int_result = ExprType::value(TypeValue::Primitive(Primitive::Int));

        match op {
            "+" => {
                // String concatenation admits any non-void operand.
                if left.display_name(self.env) == STRING {
                    return Ok(ExprType::value(left));
                }
                if right.display_name(self.env) == STRING {
                    return Ok(ExprType::value(right));
                }
                if !left.is_numeric() || !right.is_numeric() {
                    return Err(self.operand_error(node, &left, &right, op));
                }
                Ok(int_result)
            }
            "-" | "*" | "/" | "%" => {
                if !left.is_numeric() || !right.is_numeric() {
                    return Err(self.operand_error(node, &left, &right, op));
                }
                // Binary numeric promotion into int.
                Ok(int_result)
            }
            "<" | "<=" | ">" | ">=" => {
                if !left.is_numeric() || !right.is_numeric() {
                    return Err(self.operand_error(node, &left, &right, op));
                }
                Ok(bool_result)
            }
            "==" | "!=" => {
                let both_numeric = left.is_numeric() && right.is_numeric();
                let both_boolean = left.is_boolean() && right.is_boolean();
                let both_reference = left.is_reference()
                    && right.is_reference()
                    && castable(self.env, &left, &right);
                if !(both_numeric || both_boolean || both_reference) {
                    return Err(self.operand_error(node, &left, &right, op));
                }
                Ok(bool_result)
            }
            "&&" | "||" | "&" | "|" => {
                if !left.is_boolean() || !right.is_boolean() {
                    return Err(self.operand_error(node, &left, &right, op));
                }
                Ok(bool_result)
            }
            other => Err(self.err(node, format!("Unsupported operator {other}"))),
        }
    }

    fn operand_error(
        &self,
        node: NodeId,
        left: &TypeValue,
        right: &TypeValue,
        op: &str,
    ) -> SemanticError {
        self.err(
            node,
            format!(
                "Cannot use operands of type {},{} in {op} expression",
                left.display_name(self.env),
                right.display_name(self.env)
            ),
        )
    }

    fn check_instanceof(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let left_node = self
            .tree
            .child_by_field(node, "left")
            .ok_or_else(|| self.err(node, "instanceof without a left operand"))?;
        let left = self.resolve_expr(ctx, left_node)?.into_value(self.env)?;
        if !left.is_reference() {
            return Err(self.err(
                node,
                format!(
                    "Left side of instanceof must be a reference type or the null type (found {})",
                    left.display_name(self.env)
                ),
            ));
        }

        let enclosing = self.env.enclosing_type(ctx.scope);
        let right_node = self
            .tree
            .child_by_field(node, "right")
            .ok_or_else(|| self.err(node, "instanceof without a type"))?;
        let right = self.env.resolve_name(enclosing, self.text(right_node));
        match right {
            Some(value) if value.is_reference() => {
                Ok(ExprType::value(TypeValue::Primitive(Primitive::Boolean)))
            }
            _ => Err(self.err(
                node,
                format!(
                    "Right side of instanceof must be a reference type (found '{}')",
                    self.text(right_node)
                ),
            )),
        }
    }

    fn check_unary(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let operand_node = self
            .tree
            .child_by_field(node, "operand")
            .ok_or_else(|| self.err(node, "Unary expression without an operand"))?;
        let op = self
            .tree
            .child_by_field(node, "operator")
            .map(|o| self.text(o))
            .unwrap_or_default();
        let operand = self.resolve_expr(ctx, operand_node)?.into_value(self.env)?;

        match op {
            "-" => {
                if !operand.is_numeric() {
                    return Err(self.err(
                        node,
                        format!(
                            "Cannot use operand of type {} in unary negative expression",
                            operand.display_name(self.env)
                        ),
                    ));
                }
                Ok(ExprType::value(operand))
            }
            "!" => {
                if !operand.is_boolean() {
                    return Err(self.err(
                        node,
                        format!(
                            "Cannot use operand of type {} in unary complement expression",
                            operand.display_name(self.env)
                        ),
                    ));
                }
                Ok(ExprType::value(operand))
            }
            other => Err(self.err(node, format!("Unsupported unary operator {other}"))),
        }
    }

    fn check_cast(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let enclosing = self.env.enclosing_type(ctx.scope);
        let type_node = self
            .tree
            .child_by_field(node, "type")
            .ok_or_else(|| self.err(node, "Cast without a target type"))?;
        let target = self
            .env
            .resolve_name(enclosing, self.text(type_node))
            .ok_or_else(|| {
                self.err(
                    node,
                    format!("Type name '{}' could not be resolved", self.text(type_node)),
                )
            })?;

        let value_node = self
            .tree
            .child_by_field(node, "value")
            .ok_or_else(|| self.err(node, "Cast without an operand"))?;
        let source = self.resolve_expr(ctx, value_node)?.into_value(self.env)?;

        if source.is_void() {
            return Err(self.err(node, "Cast target cannot be of type void"));
        }
        if !castable(self.env, &source, &target) {
            return Err(self.err(
                node,
                format!(
                    "Cannot cast type {} to {}",
                    source.display_name(self.env),
                    target.display_name(self.env)
                ),
            ));
        }
        Ok(ExprType::value(target))
    }

    fn check_assignment(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let left_node = self
            .tree
            .child_by_field(node, "left")
            .ok_or_else(|| self.err(node, "Assignment without a left-hand side"))?;
        let right_node = self
            .tree
            .child_by_field(node, "right")
            .ok_or_else(|| self.err(node, "Assignment without a right-hand side"))?;

        // All left-hand operands are permitted, forward references included,
        // so the forward-reference context is not propagated here.
        let lhs_ctx = Ctx {
            init_span: None,
            ..ctx
        };
        let lhs = self.resolve_expr(lhs_ctx, left_node)?.into_value(self.env)?;
        let rhs = self.resolve_expr(ctx, right_node)?.into_value(self.env)?;

        if !assignable(self.env, &rhs, &lhs) {
            return Err(self.err(
                node,
                format!(
                    "Cannot assign type {} to {}",
                    rhs.display_name(self.env),
                    lhs.display_name(self.env)
                ),
            ));
        }
        Ok(ExprType::value(lhs))
    }

    fn check_array_access(&self, ctx: Ctx, node: NodeId) -> SemanticResult<ExprType> {
        let index_node = self
            .tree
            .child_by_field(node, "index")
            .ok_or_else(|| self.err(node, "Array access without an index"))?;
        let index = self.resolve_expr(ctx, index_node)?.into_value(self.env)?;
        if !index.is_numeric() {
            return Err(self.err(
                node,
                format!(
                    "Array index must be an integer type, not {}",
                    index.display_name(self.env)
                ),
            ));
        }

        let array_node = self
            .tree
            .child_by_field(node, "array")
            .ok_or_else(|| self.err(node, "Array access without a receiver"))?;
        let array = self.resolve_expr(ctx, array_node)?.into_value(self.env)?;
        match array {
            TypeValue::Array(elem) => Ok(ExprType::value(*elem)),
            other => Err(self.err(
                node,
                format!(
                    "Cannot index non-array type {}",
                    other.display_name(self.env)
                ),
            )),
        }
    }
}
